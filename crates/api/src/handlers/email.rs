use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::error::AppResult;
use crate::state::AppState;

/// Response body for the email readiness check.
#[derive(Debug, Serialize)]
pub struct EmailReadiness {
    pub ready: bool,
}

/// GET /api/v1/admin/email
///
/// Email is ready once the effective SMTP host and port are both known.
pub async fn check_email_ready(State(state): State<AppState>) -> AppResult<Json<EmailReadiness>> {
    let smtp = state.smtp_settings().await?;
    Ok(Json(EmailReadiness {
        ready: smtp.is_ready(),
    }))
}
