//! Handlers for administrator-editable site settings.
//!
//! Secrets are never returned: they come back as `*****`, and sending that
//! placeholder back on update leaves the stored value alone.

use axum::extract::State;
use axum::Json;
use mealie_core::settings::{SettingsLayer, SettingsUpdate};
use mealie_db::repositories::SiteSettingsRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/admin/detailed-settings
///
/// Returns the stored settings row with secrets masked.
pub async fn get_detailed_settings(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<SettingsLayer>>> {
    let row = SiteSettingsRepo::get(&state.pool).await?;
    Ok(Json(DataResponse {
        data: SettingsLayer::from(&row).masked(),
    }))
}

/// PUT /api/v1/admin/detailed-settings
///
/// Fields absent from the body are unchanged, `null` clears a field and
/// `*****` is ignored.
pub async fn update_detailed_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> AppResult<Json<DataResponse<SettingsLayer>>> {
    update.validate()?;

    let row = SiteSettingsRepo::get(&state.pool).await?;
    let mut layer = SettingsLayer::from(&row);
    update.apply_to(&mut layer);

    let saved = SiteSettingsRepo::save(&state.pool, &layer).await?;
    tracing::info!(ai_provider = ?saved.ai_provider, "Site settings updated");

    Ok(Json(DataResponse {
        data: SettingsLayer::from(&saved).masked(),
    }))
}
