use axum::extract::{Path, State};
use axum::Json;
use mealie_core::error::CoreError;
use mealie_core::types::DbId;
use mealie_db::models::report::ReportWithEntries;
use mealie_db::repositories::{ReportEntryRepo, ReportRepo};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/reports/{id}
///
/// Returns the report status with its entries in insertion order.
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ReportWithEntries>>> {
    let report = ReportRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Report",
            key: id.to_string(),
        })?;
    let entries = ReportEntryRepo::list_by_report(&state.pool, id).await?;

    Ok(Json(DataResponse {
        data: ReportWithEntries { report, entries },
    }))
}
