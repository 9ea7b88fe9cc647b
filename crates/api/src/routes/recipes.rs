//! Route definitions for recipe images.

use axum::routing::post;
use axum::Router;

use crate::handlers::recipe_images;
use crate::state::AppState;

/// Recipe image routes, mounted at `/recipes`.
///
/// ```text
/// POST /images/generate-missing        -> generate_missing_images
/// POST /{slug}/image/ai-generate       -> generate_recipe_image
/// POST /{slug}/image/ai-regenerate     -> regenerate_recipe_image
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/images/generate-missing",
            post(recipe_images::generate_missing_images),
        )
        .route(
            "/{slug}/image/ai-generate",
            post(recipe_images::generate_recipe_image),
        )
        .route(
            "/{slug}/image/ai-regenerate",
            post(recipe_images::regenerate_recipe_image),
        )
}
