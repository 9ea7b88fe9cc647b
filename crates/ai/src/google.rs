//! Google Gemini client over the Generative Language REST API.
//!
//! Text goes through `generateContent`. Image generation is only available
//! when an Imagen model is configured; it uses that model's `predict`
//! endpoint.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use mealie_core::settings::AiProviderKind;
use serde::Deserialize;

use crate::error::AiError;
use crate::provider::{ensure_success, AiProvider};
use crate::types::AiImage;

pub const DEFAULT_GOOGLE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Sampling temperature for text generation.
const GOOGLE_TEMPERATURE: f64 = 0.7;

/// Suffix appended to the prompt when a JSON response is requested.
const JSON_INSTRUCTION: &str = "\n\nPlease provide the response in valid JSON format.";

/// Client for the Gemini API.
pub struct GoogleProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    image_model: Option<String>,
    base_url: String,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
}

/// Single-turn prompt: system text, a blank line, then the user message.
fn full_prompt(system_prompt: &str, message: &str, force_json: bool) -> String {
    let mut prompt = format!("{system_prompt}\n\n{message}");
    if force_json {
        prompt.push_str(JSON_INSTRUCTION);
    }
    prompt
}

fn generate_content_body(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        "generationConfig": { "temperature": GOOGLE_TEMPERATURE },
    })
}

fn predict_body(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "instances": [{ "prompt": prompt }],
        "parameters": { "sampleCount": 1 },
    })
}

/// Concatenated text parts of the first candidate.
fn response_text(response: GenerateContentResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    Some(text)
}

fn first_prediction_bytes(response: PredictResponse) -> Result<Option<Vec<u8>>, AiError> {
    let Some(encoded) = response
        .predictions
        .into_iter()
        .next()
        .and_then(|p| p.bytes_base64_encoded)
    else {
        return Ok(None);
    };
    BASE64
        .decode(encoded.as_bytes())
        .map(Some)
        .map_err(|e| AiError::Decode {
            provider: AiProviderKind::Google,
            message: format!("invalid base64 image data: {e}"),
        })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

impl GoogleProvider {
    pub fn new(
        client: reqwest::Client,
        api_key: String,
        model: String,
        image_model: Option<String>,
        base_url: Option<String>,
    ) -> Self {
        Self {
            client,
            api_key,
            model,
            image_model,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_GOOGLE_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        model: &str,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<T, AiError> {
        let response = self
            .client
            .post(format!("{}/models/{model}:{method}", self.base_url))
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;
        let response = ensure_success(AiProviderKind::Google, response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl AiProvider for GoogleProvider {
    fn kind(&self) -> AiProviderKind {
        AiProviderKind::Google
    }

    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn get_response(
        &self,
        system_prompt: &str,
        message: &str,
        images: &[AiImage],
        force_json: bool,
    ) -> Result<Option<String>, AiError> {
        if !images.is_empty() {
            tracing::debug!(count = images.len(), "Gemini requests are text-only, ignoring images");
        }
        let body = generate_content_body(&full_prompt(system_prompt, message, force_json));

        match self
            .call::<GenerateContentResponse>(&self.model, "generateContent", &body)
            .await
        {
            Ok(response) => Ok(response_text(response)),
            Err(e) => {
                tracing::error!(error = %e, model = %self.model, "Google AI request failed");
                Ok(None)
            }
        }
    }

    async fn generate_image(&self, prompt: &str) -> Result<Option<Vec<u8>>, AiError> {
        let Some(image_model) = &self.image_model else {
            tracing::warn!("Google image generation is not configured (GOOGLE_IMAGE_MODEL unset)");
            return Ok(None);
        };

        let result = self
            .call::<PredictResponse>(image_model, "predict", &predict_body(prompt))
            .await
            .and_then(first_prediction_bytes);
        match result {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                tracing::error!(error = %e, model = %image_model, "Google image generation failed");
                Ok(None)
            }
        }
    }
}
