//! Handlers for AI recipe image generation.
//!
//! Single-recipe generation runs inside the request. Batch generation
//! creates a report, answers `202 Accepted` and continues in a background
//! task.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use mealie_ai::{AiError, AiService};
use mealie_core::types::DbId;
use mealie_pipeline::{GeneratedImage, RecipeForImage};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Optional body of `POST /recipes/{slug}/image/ai-regenerate`.
#[derive(Debug, Default, Deserialize)]
pub struct RegenerateImageRequest {
    /// Extra text appended to the generated prompt.
    pub custom_prompt: Option<String>,
}

/// Response body of `POST /recipes/images/generate-missing`.
#[derive(Debug, Serialize)]
pub struct BatchStarted {
    pub report_id: DbId,
}

/// Result of a single-recipe generation.
#[derive(Debug, Serialize)]
pub struct RecipeImageResponse {
    pub message: String,
    pub slug: String,
    /// Extension of the stored image.
    pub image: &'static str,
}

impl RecipeImageResponse {
    fn new(message: String, recipe: RecipeForImage, image: GeneratedImage) -> Self {
        Self {
            message,
            slug: recipe.slug,
            image: image.extension,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ensure_image_services(state: &AppState) -> AppResult<()> {
    if state.ai_config.enable_image_services {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "AI image services are not enabled".into(),
        ))
    }
}

/// AI service for the current settings, rejected up front when the
/// selected provider has no credential.
async fn configured_ai(state: &AppState) -> AppResult<AiService> {
    let ai = state.ai_service().await?;
    if !ai.is_configured() {
        return Err(AiError::MissingCredential {
            provider: ai.provider_kind(),
        }
        .into());
    }
    Ok(ai)
}

fn parse_regenerate_body(body: &Bytes) -> AppResult<RegenerateImageRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RegenerateImageRequest::default());
    }
    let request: Option<RegenerateImageRequest> = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?;
    Ok(request.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/recipes/images/generate-missing
///
/// Starts a batch run over every recipe and returns the report id.
pub async fn generate_missing_images(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<BatchStarted>)> {
    ensure_image_services(&state)?;
    let ai = configured_ai(&state).await?;

    let job = state.batch_image_job(ai);
    let report_id = job.start_report().await?;

    state.background.spawn(async move {
        if let Err(e) = job.run(report_id).await {
            tracing::error!(report_id, error = %e, "Batch image generation could not be finalized");
        }
    });

    tracing::info!(report_id, "Started batch AI image generation");
    Ok((StatusCode::ACCEPTED, Json(BatchStarted { report_id })))
}

/// POST /api/v1/recipes/{slug}/image/ai-generate
///
/// Generates an image for a recipe without one. 400 if a valid image is
/// already stored.
pub async fn generate_recipe_image(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<RecipeImageResponse>>> {
    ensure_image_services(&state)?;
    let ai = configured_ai(&state).await?;

    let (recipe, image) = state.image_pipeline(ai).generate_for_slug(&slug).await?;
    let message = format!("AI image generated for {}", recipe.name);

    Ok(Json(DataResponse {
        data: RecipeImageResponse::new(message, recipe, image),
    }))
}

/// POST /api/v1/recipes/{slug}/image/ai-regenerate
///
/// Replaces the recipe image. Accepts an optional `{ "custom_prompt": "..." }`.
pub async fn regenerate_recipe_image(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    body: Bytes,
) -> AppResult<Json<DataResponse<RecipeImageResponse>>> {
    ensure_image_services(&state)?;
    let request = parse_regenerate_body(&body)?;
    let ai = configured_ai(&state).await?;

    let (recipe, image) = state
        .image_pipeline(ai)
        .regenerate_for_slug(&slug, request.custom_prompt.as_deref())
        .await?;
    let message = format!("AI image regenerated for {}", recipe.name);

    Ok(Json(DataResponse {
        data: RecipeImageResponse::new(message, recipe, image),
    }))
}
