pub mod admin;
pub mod health;
pub mod recipes;
pub mod reports;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /admin/detailed-settings                         get, update (PUT)
/// /admin/email                                     email readiness (GET)
///
/// /recipes/images/generate-missing                 start batch generation (POST)
/// /recipes/{slug}/image/ai-generate                generate missing image (POST)
/// /recipes/{slug}/image/ai-regenerate              replace image (POST)
///
/// /reports/{id}                                    report with entries (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/admin", admin::router())
        .nest("/recipes", recipes::router())
        .nest("/reports", reports::router())
}
