use axum::routing::get;
use axum::Router;

use crate::handlers::reports;
use crate::state::AppState;

/// Report routes, mounted at `/reports`.
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(reports::get_report))
}
