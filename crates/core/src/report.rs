//! Generation report statuses, entry drafts and status aggregation.
//!
//! A report is created `in_progress` when a batch starts. Entries are
//! collected while items are processed and the final status is computed
//! once, after every item has finished.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Report name used for batch AI image generation runs.
pub const BATCH_IMAGE_REPORT_NAME: &str = "Batch AI Image Generation";

/// Report category for AI image generation.
pub const CATEGORY_AI_IMAGE_GENERATION: &str = "ai_image_generation";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    InProgress,
    Success,
    Failure,
    Partial,
}

impl ReportStatus {
    /// Value stored in the `reports.status` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Partial => "partial",
        }
    }

    /// Parse the stored column value.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "in_progress" => Ok(Self::InProgress),
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "partial" => Ok(Self::Partial),
            other => Err(CoreError::Validation(format!(
                "Unknown report status '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for ReportStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_name(&value)
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// An outcome record not yet written to the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntryDraft {
    pub success: bool,
    pub message: String,
    /// Error text for failed entries; empty for successes.
    pub exception: String,
}

impl ReportEntryDraft {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            exception: String::new(),
        }
    }

    pub fn failure(message: impl Into<String>, exception: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            exception: exception.into(),
        }
    }
}

/// Compute the terminal status for a finished batch.
///
/// All entries succeeded (including none at all) is `Success`, none
/// succeeded is `Failure`, anything mixed is `Partial`.
pub fn aggregate_status(entries: &[ReportEntryDraft]) -> ReportStatus {
    let succeeded = entries.iter().filter(|e| e.success).count();
    if succeeded == entries.len() {
        ReportStatus::Success
    } else if succeeded == 0 {
        ReportStatus::Failure
    } else {
        ReportStatus::Partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_success_is_success() {
        let entries = vec![
            ReportEntryDraft::success("a"),
            ReportEntryDraft::success("b"),
        ];
        assert_eq!(aggregate_status(&entries), ReportStatus::Success);
    }

    #[test]
    fn all_failed_is_failure() {
        let entries = vec![
            ReportEntryDraft::failure("a", "boom"),
            ReportEntryDraft::failure("b", "boom"),
        ];
        assert_eq!(aggregate_status(&entries), ReportStatus::Failure);
    }

    #[test]
    fn mixed_is_partial() {
        let entries = vec![
            ReportEntryDraft::success("a"),
            ReportEntryDraft::success("b"),
            ReportEntryDraft::failure("c", "boom"),
        ];
        assert_eq!(aggregate_status(&entries), ReportStatus::Partial);
    }

    #[test]
    fn nothing_to_do_is_success() {
        assert_eq!(aggregate_status(&[]), ReportStatus::Success);
    }

    #[test]
    fn status_names_round_trip_through_column_value() {
        for status in [
            ReportStatus::InProgress,
            ReportStatus::Success,
            ReportStatus::Failure,
            ReportStatus::Partial,
        ] {
            assert_eq!(ReportStatus::from_name(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_rejected() {
        let err = ReportStatus::from_name("done").unwrap_err();
        assert!(err.to_string().contains("Unknown report status"));
    }

    #[test]
    fn column_value_converts() {
        assert_eq!(
            ReportStatus::try_from("partial".to_string()).unwrap(),
            ReportStatus::Partial
        );
        assert!(ReportStatus::try_from(String::new()).is_err());
    }
}
