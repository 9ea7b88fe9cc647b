//! OpenAI-compatible client: chat completions and DALL-E image generation.
//!
//! Any server speaking the OpenAI REST dialect works; the base URL, extra
//! headers and extra query parameters are configurable.

use std::collections::BTreeMap;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use mealie_core::settings::AiProviderKind;
use serde::Deserialize;

use crate::error::AiError;
use crate::provider::{ensure_success, AiProvider};
use crate::types::AiImage;

/// Base URL used when none is configured.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Image model used for recipe image generation.
pub const OPENAI_IMAGE_MODEL: &str = "dall-e-3";

const OPENAI_IMAGE_SIZE: &str = "1024x1024";
const OPENAI_IMAGE_QUALITY: &str = "standard";

/// Client for an OpenAI-compatible API.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    custom_headers: BTreeMap<String, String>,
    custom_params: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    b64_json: Option<String>,
}

/// Build the chat-completions request body.
fn chat_request_body(
    model: &str,
    system_prompt: &str,
    message: &str,
    image_parts: Vec<serde_json::Value>,
    force_json: bool,
) -> serde_json::Value {
    let mut content = vec![serde_json::json!({ "type": "text", "text": message })];
    content.extend(image_parts);

    let mut body = serde_json::json!({
        "model": model,
        "messages": [
            { "role": "system", "content": system_prompt },
            { "role": "user", "content": content },
        ],
    });
    if force_json {
        body["response_format"] = serde_json::json!({ "type": "json_object" });
    }
    body
}

fn image_request_body(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "model": OPENAI_IMAGE_MODEL,
        "prompt": prompt,
        "size": OPENAI_IMAGE_SIZE,
        "quality": OPENAI_IMAGE_QUALITY,
        "n": 1,
        "response_format": "b64_json",
    })
}

/// Text of the first choice, if any.
fn first_choice_content(completion: ChatCompletion) -> Option<String> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
}

fn first_image_bytes(response: ImagesResponse) -> Result<Option<Vec<u8>>, AiError> {
    let Some(encoded) = response.data.into_iter().next().and_then(|d| d.b64_json) else {
        return Ok(None);
    };
    BASE64
        .decode(encoded.as_bytes())
        .map(Some)
        .map_err(|e| AiError::Decode {
            provider: AiProviderKind::OpenAi,
            message: format!("invalid base64 image data: {e}"),
        })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

impl OpenAiProvider {
    pub fn new(
        client: reqwest::Client,
        api_key: Option<String>,
        model: String,
        base_url: Option<String>,
    ) -> Self {
        Self {
            client,
            api_key,
            model,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            custom_headers: BTreeMap::new(),
            custom_params: BTreeMap::new(),
        }
    }

    /// Attach extra headers and query parameters to every request.
    pub fn with_customizations(
        mut self,
        headers: BTreeMap<String, String>,
        params: BTreeMap<String, String>,
    ) -> Self {
        self.custom_headers = headers;
        self.custom_params = params;
        self
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .post(format!("{}/{path}", self.base_url))
            .query(&self.custom_params);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        for (name, value) in &self.custom_headers {
            request = request.header(name.as_str(), value.as_str());
        }
        request
    }

    async fn send_chat(&self, body: &serde_json::Value) -> Result<Option<String>, AiError> {
        let response = self.post("chat/completions").json(body).send().await?;
        let response = ensure_success(AiProviderKind::OpenAi, response).await?;
        let completion: ChatCompletion = response.json().await?;
        Ok(first_choice_content(completion))
    }

    async fn send_image(&self, prompt: &str) -> Result<Option<Vec<u8>>, AiError> {
        let response = self
            .post("images/generations")
            .json(&image_request_body(prompt))
            .send()
            .await?;
        let response = ensure_success(AiProviderKind::OpenAi, response).await?;
        first_image_bytes(response.json().await?)
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn kind(&self) -> AiProviderKind {
        AiProviderKind::OpenAi
    }

    fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    async fn get_response(
        &self,
        system_prompt: &str,
        message: &str,
        images: &[AiImage],
        force_json: bool,
    ) -> Result<Option<String>, AiError> {
        let mut image_parts = Vec::with_capacity(images.len());
        for image in images {
            image_parts.push(image.content_part().await?);
        }
        let body = chat_request_body(&self.model, system_prompt, message, image_parts, force_json);

        match self.send_chat(&body).await {
            Ok(content) => Ok(content),
            Err(e) => {
                tracing::error!(error = %e, model = %self.model, "OpenAI request failed");
                Ok(None)
            }
        }
    }

    async fn generate_image(&self, prompt: &str) -> Result<Option<Vec<u8>>, AiError> {
        match self.send_image(prompt).await {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                tracing::error!(error = %e, "OpenAI image generation failed");
                Ok(None)
            }
        }
    }
}
