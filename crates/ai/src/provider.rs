//! The contract every AI vendor client implements.

use async_trait::async_trait;
use mealie_core::settings::AiProviderKind;

use crate::error::AiError;
use crate::types::AiImage;

/// A text and image generation backend.
///
/// Vendor transport failures are logged by the implementation and reported
/// as `Ok(None)`. `Err` is reserved for problems with the caller's inputs.
#[async_trait]
pub trait AiProvider: Send + Sync {
    fn kind(&self) -> AiProviderKind;

    /// Whether the provider has the credential it needs to make calls.
    fn is_configured(&self) -> bool;

    /// Send a system prompt and user message, returning the model's text.
    async fn get_response(
        &self,
        system_prompt: &str,
        message: &str,
        images: &[AiImage],
        force_json: bool,
    ) -> Result<Option<String>, AiError>;

    /// Generate a single image, returning the encoded bytes.
    async fn generate_image(&self, prompt: &str) -> Result<Option<Vec<u8>>, AiError>;
}

/// Ensure a vendor response has a success status code. On failure the body
/// text is captured into [`AiError::Api`].
pub(crate) async fn ensure_success(
    provider: AiProviderKind,
    response: reqwest::Response,
) -> Result<reqwest::Response, AiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(AiError::Api {
            provider,
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}
