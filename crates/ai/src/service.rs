//! AI request/response service.
//!
//! One [`AiService`] is built per operation from freshly resolved settings,
//! so administrator changes apply to the next request without a restart.

use std::sync::Arc;

use mealie_core::settings::{select_provider, AiProviderKind, ResolvedSettings};
use mealie_core::watermark::{apply_watermark, DEFAULT_OPACITY};

use crate::config::AiConfig;
use crate::error::AiError;
use crate::google::GoogleProvider;
use crate::openai::OpenAiProvider;
use crate::prompts::PromptLibrary;
use crate::provider::AiProvider;
use crate::types::{AiImage, DataInjection};

/// Facade over the selected provider, the prompt library and image
/// post-processing.
#[derive(Clone)]
pub struct AiService {
    provider: Arc<dyn AiProvider>,
    config: AiConfig,
    prompts: PromptLibrary,
}

impl std::fmt::Debug for AiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiService")
            .field("provider", &self.provider.kind())
            .field("config", &self.config)
            .finish()
    }
}

impl AiService {
    /// Select and construct the provider for the given settings.
    ///
    /// Google is used only when requested and its key is present; a Google
    /// request without a key falls back to OpenAI with a warning.
    pub fn new(settings: &ResolvedSettings, config: &AiConfig, client: reqwest::Client) -> Self {
        let selected = select_provider(settings.ai_provider, settings.google_api_key.as_deref());
        if settings.ai_provider == AiProviderKind::Google && selected != AiProviderKind::Google {
            tracing::warn!("Google AI selected but no API key found, falling back to OpenAI");
        }

        let provider: Arc<dyn AiProvider> = match (selected, &settings.google_api_key) {
            (AiProviderKind::Google, Some(key)) => Arc::new(GoogleProvider::new(
                client,
                key.clone(),
                settings.google_model.clone(),
                config.google_image_model.clone(),
                config.google_base_url.clone(),
            )),
            _ => Arc::new(
                OpenAiProvider::new(
                    client,
                    settings.openai_api_key.clone(),
                    settings.openai_model.clone(),
                    settings.openai_base_url.clone(),
                )
                .with_customizations(config.custom_headers.clone(), config.custom_params.clone()),
            ),
        };

        tracing::debug!(provider = %provider.kind(), "AI service initialised");
        Self::with_provider(provider, config)
    }

    /// Build a service around an explicit provider.
    pub fn with_provider(provider: Arc<dyn AiProvider>, config: &AiConfig) -> Self {
        Self {
            provider,
            prompts: PromptLibrary::new(config.prompts_dir.clone()),
            config: config.clone(),
        }
    }

    pub fn provider_kind(&self) -> AiProviderKind {
        self.provider.kind()
    }

    /// Whether the selected provider has its credential.
    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    pub fn image_services_enabled(&self) -> bool {
        self.config.enable_image_services
    }

    /// Load a prompt template by dotted name and append `injections`.
    pub async fn get_prompt(
        &self,
        name: &str,
        injections: &[DataInjection],
    ) -> Result<String, AiError> {
        self.prompts.get_prompt(name, injections).await
    }

    fn require_credential(&self) -> Result<(), AiError> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(AiError::MissingCredential {
                provider: self.provider.kind(),
            })
        }
    }

    /// Send a prompt and message to the provider.
    ///
    /// Images are dropped when image services are disabled. Returns
    /// `Ok(None)` when the provider produced no answer.
    pub async fn get_response(
        &self,
        system_prompt: &str,
        message: &str,
        images: &[AiImage],
        force_json: bool,
    ) -> Result<Option<String>, AiError> {
        let images = if !images.is_empty() && !self.config.enable_image_services {
            tracing::warn!("AI image services are disabled, ignoring images");
            &[][..]
        } else {
            images
        };

        self.require_credential()?;

        self.provider
            .get_response(system_prompt, message, images, force_json)
            .await
            .map_err(AiError::wrap)
    }

    /// Generate an image and stamp the AI badge onto it.
    ///
    /// Returns `Ok(None)` when image services are disabled or the provider
    /// produced nothing. A watermarking failure returns the raw bytes.
    pub async fn generate_image(&self, prompt: &str) -> Result<Option<Vec<u8>>, AiError> {
        if !self.config.enable_image_services {
            tracing::warn!("AI image services are disabled");
            return Ok(None);
        }

        self.require_credential()?;

        let Some(bytes) = self
            .provider
            .generate_image(prompt)
            .await
            .map_err(AiError::wrap)?
        else {
            return Ok(None);
        };

        Ok(Some(self.watermark(bytes).await))
    }

    async fn watermark(&self, bytes: Vec<u8>) -> Vec<u8> {
        let badge = self.config.watermark_path.clone();
        let raw = bytes.clone();
        let result = tokio::task::spawn_blocking(move || {
            apply_watermark(&bytes, badge.as_deref(), DEFAULT_OPACITY)
        })
        .await;

        match result {
            Ok(Ok(watermarked)) => watermarked,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Failed to apply watermark, returning original image");
                raw
            }
            Err(e) => {
                tracing::warn!(error = %e, "Watermark task failed, returning original image");
                raw
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use image::{ImageFormat, Rgb, RgbImage};
    use mealie_core::settings::{DEFAULT_GOOGLE_MODEL, DEFAULT_OPENAI_MODEL};

    use super::*;

    /// Provider double recording calls and returning canned results.
    struct FakeProvider {
        configured: bool,
        response: Option<String>,
        image: Option<Vec<u8>>,
        fail: bool,
        calls: AtomicUsize,
        images_seen: AtomicUsize,
    }

    impl FakeProvider {
        fn new() -> Self {
            Self {
                configured: true,
                response: Some("{}".into()),
                image: None,
                fail: false,
                calls: AtomicUsize::new(0),
                images_seen: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AiProvider for FakeProvider {
        fn kind(&self) -> AiProviderKind {
            AiProviderKind::OpenAi
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn get_response(
            &self,
            _system_prompt: &str,
            _message: &str,
            images: &[AiImage],
            _force_json: bool,
        ) -> Result<Option<String>, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.images_seen.fetch_add(images.len(), Ordering::SeqCst);
            if self.fail {
                return Err(AiError::ImageInput("unreadable".into()));
            }
            Ok(self.response.clone())
        }

        async fn generate_image(&self, _prompt: &str) -> Result<Option<Vec<u8>>, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.image.clone())
        }
    }

    fn settings(provider: AiProviderKind, google_key: Option<&str>) -> ResolvedSettings {
        ResolvedSettings {
            ai_provider: provider,
            openai_api_key: Some("sk-test".into()),
            openai_model: DEFAULT_OPENAI_MODEL.into(),
            openai_base_url: None,
            google_api_key: google_key.map(str::to_string),
            google_model: DEFAULT_GOOGLE_MODEL.into(),
        }
    }

    fn png_bytes() -> Vec<u8> {
        let mut out = Vec::new();
        RgbImage::from_pixel(300, 300, Rgb([90, 120, 30]))
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn google_without_key_uses_openai() {
        let service = AiService::new(
            &settings(AiProviderKind::Google, None),
            &AiConfig::default(),
            reqwest::Client::new(),
        );
        assert_eq!(service.provider_kind(), AiProviderKind::OpenAi);
    }

    #[test]
    fn google_with_key_uses_google() {
        let service = AiService::new(
            &settings(AiProviderKind::Google, Some("g-key")),
            &AiConfig::default(),
            reqwest::Client::new(),
        );
        assert_eq!(service.provider_kind(), AiProviderKind::Google);
    }

    #[tokio::test]
    async fn missing_credential_rejected_before_call() {
        let provider = Arc::new(FakeProvider {
            configured: false,
            ..FakeProvider::new()
        });
        let service = AiService::with_provider(provider.clone(), &AiConfig::default());

        let err = service.get_response("sys", "msg", &[], true).await.unwrap_err();
        assert_matches!(err, AiError::MissingCredential { .. });
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn provider_errors_are_wrapped() {
        let provider = Arc::new(FakeProvider {
            fail: true,
            ..FakeProvider::new()
        });
        let service = AiService::with_provider(provider, &AiConfig::default());

        let err = service.get_response("sys", "msg", &[], true).await.unwrap_err();
        assert!(err.to_string().starts_with("AI Request Failed. ImageInputError: "));
    }

    #[tokio::test]
    async fn images_dropped_when_image_services_disabled() {
        let provider = Arc::new(FakeProvider::new());
        let config = AiConfig {
            enable_image_services: false,
            ..AiConfig::default()
        };
        let service = AiService::with_provider(provider.clone(), &config);

        let images = [AiImage::external("https://example.com/a.png")];
        let response = service.get_response("sys", "msg", &images, false).await.unwrap();

        assert_eq!(response.as_deref(), Some("{}"));
        assert_eq!(provider.images_seen.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn image_generation_disabled_returns_none_without_calling() {
        let provider = Arc::new(FakeProvider::new());
        let config = AiConfig {
            enable_image_services: false,
            ..AiConfig::default()
        };
        let service = AiService::with_provider(provider.clone(), &config);

        assert_eq!(service.generate_image("soup").await.unwrap(), None);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn generated_image_is_watermarked() {
        let raw = png_bytes();
        let provider = Arc::new(FakeProvider {
            image: Some(raw.clone()),
            ..FakeProvider::new()
        });
        let service = AiService::with_provider(provider, &AiConfig::default());

        let bytes = service.generate_image("soup").await.unwrap().unwrap();
        assert_ne!(bytes, raw);
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
    }

    #[tokio::test]
    async fn undecodable_image_falls_back_to_raw_bytes() {
        let provider = Arc::new(FakeProvider {
            image: Some(b"not an image".to_vec()),
            ..FakeProvider::new()
        });
        let service = AiService::with_provider(provider, &AiConfig::default());

        let bytes = service.generate_image("soup").await.unwrap().unwrap();
        assert_eq!(bytes, b"not an image".to_vec());
    }

    #[tokio::test]
    async fn service_loads_bundled_prompts() {
        let service = AiService::with_provider(Arc::new(FakeProvider::new()), &AiConfig::default());
        let injection = DataInjection::text("Ingredients", "2 cups flour").unwrap();
        let prompt = service
            .get_prompt("recipes.parse-recipe-ingredients", &[injection])
            .await
            .unwrap();
        assert!(prompt.ends_with("\n###\nIngredients\n---\n\n2 cups flour\n"));
    }
}
