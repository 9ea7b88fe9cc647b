use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mealie_ai::AiError;
use mealie_core::error::CoreError;
use mealie_pipeline::PipelineError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `mealie_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An error from the AI layer.
    #[error(transparent)]
    Ai(#[from] AiError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An upstream AI provider did not deliver a usable result.
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let message = err.to_string();
        match err {
            PipelineError::Core(e) => Self::Core(e),
            PipelineError::Database(e) => Self::Database(e),
            PipelineError::Ai(e) => Self::Ai(e),
            PipelineError::ImageExists(_) => Self::BadRequest(message),
            PipelineError::NoImageGenerated | PipelineError::UnsupportedImage => {
                Self::BadGateway(message)
            }
            PipelineError::Io(_) => Self::InternalError(message),
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", core.to_string())
                }
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- AI errors ---
            AppError::Ai(err) => classify_ai_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::BadGateway(msg) => {
                tracing::warn!(error = %msg, "AI provider returned no usable result");
                (StatusCode::BAD_GATEWAY, "AI_PROVIDER_ERROR", msg.clone())
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify an AI error into an HTTP status, error code, and message.
///
/// - Missing credentials map to 400; the administrator has to act.
/// - Input problems (prompts, injections) map to 400.
/// - Wrapped provider failures map to 502.
/// - Anything else maps to 500 with a sanitized message.
fn classify_ai_error(err: &AiError) -> (StatusCode, &'static str, String) {
    match err {
        AiError::MissingCredential { .. } => {
            (StatusCode::BAD_REQUEST, "AI_NOT_CONFIGURED", err.to_string())
        }
        AiError::EmptyPromptName
        | AiError::InvalidPromptName(_)
        | AiError::EmptyInjection(_)
        | AiError::ImageInput(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string()),
        AiError::RequestFailed { .. } => {
            tracing::error!(error = %err, "AI request failed");
            (StatusCode::BAD_GATEWAY, "AI_REQUEST_FAILED", err.to_string())
        }
        other => {
            tracing::error!(error = %other, "AI error");
            internal()
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}
