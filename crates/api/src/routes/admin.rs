//! Route definitions for site administration.

use axum::routing::get;
use axum::Router;

use crate::handlers::{email, site_settings};
use crate::state::AppState;

/// Admin routes, mounted at `/admin`.
///
/// ```text
/// GET  /detailed-settings    -> get_detailed_settings
/// PUT  /detailed-settings    -> update_detailed_settings
/// GET  /email                -> check_email_ready
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/detailed-settings",
            get(site_settings::get_detailed_settings).put(site_settings::update_detailed_settings),
        )
        .route("/email", get(email::check_email_ready))
}
