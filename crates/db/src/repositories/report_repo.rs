//! Repositories for the `reports` and `report_entries` tables.

use mealie_core::report::{ReportEntryDraft, ReportStatus};
use mealie_core::types::DbId;
use sqlx::PgPool;

use crate::models::report::{CreateReport, Report, ReportEntry};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, category, status, created_at, updated_at";

/// Column list for `report_entries`.
const ENTRY_COLUMNS: &str = "id, report_id, success, message, exception, created_at";

/// Provides create, lookup and finalization for reports.
pub struct ReportRepo;

impl ReportRepo {
    /// Insert a new report, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateReport) -> Result<Report, sqlx::Error> {
        let query = format!(
            "INSERT INTO reports (name, category, status)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(&input.name)
            .bind(&input.category)
            .bind(input.status.as_str())
            .fetch_one(pool)
            .await
    }

    /// Find a report by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Report>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reports WHERE id = $1");
        sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Attach `entries` and move the report to its terminal `status` in one
    /// transaction.
    ///
    /// Only a report still `in_progress` is finalized. Returns `false` (and
    /// writes nothing) if the report is missing or already terminal.
    pub async fn finalize(
        pool: &PgPool,
        id: DbId,
        entries: &[ReportEntryDraft],
        status: ReportStatus,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE reports SET status = $2, updated_at = NOW()
             WHERE id = $1 AND status = 'in_progress'",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        for entry in entries {
            sqlx::query(
                "INSERT INTO report_entries (report_id, success, message, exception)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(id)
            .bind(entry.success)
            .bind(&entry.message)
            .bind(&entry.exception)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}

/// Provides read access to report entries.
pub struct ReportEntryRepo;

impl ReportEntryRepo {
    /// List the entries of a report in insertion order.
    pub async fn list_by_report(
        pool: &PgPool,
        report_id: DbId,
    ) -> Result<Vec<ReportEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {ENTRY_COLUMNS} FROM report_entries
             WHERE report_id = $1
             ORDER BY id"
        );
        sqlx::query_as::<_, ReportEntry>(&query)
            .bind(report_id)
            .fetch_all(pool)
            .await
    }
}
