//! Report and report entry models (batch operation audit trail).

use mealie_core::report::ReportStatus;
use mealie_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `reports` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Report {
    pub id: DbId,
    pub name: String,
    pub category: String,
    #[sqlx(try_from = "String")]
    pub status: ReportStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `report_entries` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReportEntry {
    pub id: DbId,
    pub report_id: DbId,
    pub success: bool,
    pub message: String,
    pub exception: String,
    pub created_at: Timestamp,
}

/// DTO for creating a new report.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReport {
    pub name: String,
    pub category: String,
    pub status: ReportStatus,
}

/// A report together with its ordered entries.
#[derive(Debug, Clone, Serialize)]
pub struct ReportWithEntries {
    #[serde(flatten)]
    pub report: Report,
    pub entries: Vec<ReportEntry>,
}
