//! Integration tests for the report audit trail.
//!
//! Exercises `ReportRepo` and `ReportEntryRepo` against a real database:
//! - New reports start in progress
//! - Finalization writes entries and status together
//! - A finalized report cannot be finalized again
//! - Entries come back in insertion order

use mealie_core::report::{ReportEntryDraft, ReportStatus, CATEGORY_AI_IMAGE_GENERATION};
use mealie_db::models::report::CreateReport;
use mealie_db::repositories::{ReportEntryRepo, ReportRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_report() -> CreateReport {
    CreateReport {
        name: "Missing recipe images".to_string(),
        category: CATEGORY_AI_IMAGE_GENERATION.to_string(),
        status: ReportStatus::InProgress,
    }
}

fn mixed_entries() -> Vec<ReportEntryDraft> {
    vec![
        ReportEntryDraft::success("Generated image for Pancakes"),
        ReportEntryDraft::failure("Failed to generate image for Curry", "AI Request Failed"),
        ReportEntryDraft::success("Generated image for Soup"),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_report_starts_in_progress(pool: PgPool) {
    let report = ReportRepo::create(&pool, &new_report()).await.unwrap();
    assert_eq!(report.status, ReportStatus::InProgress);
    assert_eq!(report.category, CATEGORY_AI_IMAGE_GENERATION);

    let found = ReportRepo::find_by_id(&pool, report.id)
        .await
        .unwrap()
        .expect("report should exist");
    assert_eq!(found.status, ReportStatus::InProgress);
    assert!(ReportEntryRepo::list_by_report(&pool, report.id)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_finalize_writes_entries_and_status(pool: PgPool) {
    let report = ReportRepo::create(&pool, &new_report()).await.unwrap();

    let finalized = ReportRepo::finalize(&pool, report.id, &mixed_entries(), ReportStatus::Partial)
        .await
        .unwrap();
    assert!(finalized);

    let found = ReportRepo::find_by_id(&pool, report.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.status, ReportStatus::Partial);

    let entries = ReportEntryRepo::list_by_report(&pool, report.id)
        .await
        .unwrap();
    let messages: Vec<&str> = entries.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        [
            "Generated image for Pancakes",
            "Failed to generate image for Curry",
            "Generated image for Soup",
        ]
    );
    assert!(entries[0].success);
    assert_eq!(entries[0].exception, "");
    assert!(!entries[1].success);
    assert_eq!(entries[1].exception, "AI Request Failed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_second_finalize_is_rejected(pool: PgPool) {
    let report = ReportRepo::create(&pool, &new_report()).await.unwrap();
    assert!(
        ReportRepo::finalize(&pool, report.id, &mixed_entries(), ReportStatus::Partial)
            .await
            .unwrap()
    );

    let again = ReportRepo::finalize(
        &pool,
        report.id,
        &[ReportEntryDraft::success("late entry")],
        ReportStatus::Success,
    )
    .await
    .unwrap();
    assert!(!again);

    let found = ReportRepo::find_by_id(&pool, report.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.status, ReportStatus::Partial);
    let entries = ReportEntryRepo::list_by_report(&pool, report.id)
        .await
        .unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.message != "late entry"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_finalize_missing_report(pool: PgPool) {
    let finalized = ReportRepo::finalize(
        &pool,
        999_999,
        &[ReportEntryDraft::success("orphan")],
        ReportStatus::Success,
    )
    .await
    .unwrap();
    assert!(!finalized);

    let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM report_entries")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orphans, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_finalize_empty_batch(pool: PgPool) {
    let report = ReportRepo::create(&pool, &new_report()).await.unwrap();
    assert!(ReportRepo::finalize(&pool, report.id, &[], ReportStatus::Success)
        .await
        .unwrap());

    let found = ReportRepo::find_by_id(&pool, report.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.status, ReportStatus::Success);
}
