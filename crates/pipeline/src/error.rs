use mealie_ai::AiError;
use mealie_core::error::CoreError;

/// Errors raised while generating recipe images.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error("Image storage failed: {0}")]
    Io(#[from] std::io::Error),

    /// The provider answered without an image.
    #[error("Failed to generate image from AI provider")]
    NoImageGenerated,

    /// The provider returned bytes that are not a supported image format.
    #[error("AI provider returned an unsupported image format")]
    UnsupportedImage,

    /// Plain generation was requested but a valid image is already stored.
    #[error("Recipe '{0}' already has an image")]
    ImageExists(String),
}
