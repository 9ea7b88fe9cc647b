//! Process-level AI configuration that is not editable through site
//! settings.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// AI service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Master switch for image inputs and image generation.
    pub enable_image_services: bool,
    /// Timeout applied to every vendor HTTP request, in seconds.
    pub request_timeout_secs: u64,
    /// Extra headers sent with every OpenAI request.
    pub custom_headers: BTreeMap<String, String>,
    /// Extra query parameters sent with every OpenAI request.
    pub custom_params: BTreeMap<String, String>,
    /// Imagen model used for Google image generation. Unset disables it.
    pub google_image_model: Option<String>,
    /// Generative Language API root. Unset uses the public endpoint.
    pub google_base_url: Option<String>,
    /// Directory whose templates take precedence over the bundled ones.
    pub prompts_dir: Option<PathBuf>,
    /// Badge stamped onto generated images. Unset uses the bundled badge.
    pub watermark_path: Option<PathBuf>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enable_image_services: true,
            request_timeout_secs: 300,
            custom_headers: BTreeMap::new(),
            custom_params: BTreeMap::new(),
            google_image_model: None,
            google_base_url: None,
            prompts_dir: None,
            watermark_path: None,
        }
    }
}

/// Parse a JSON object of scalar values into a string map.
fn parse_string_map(key: &str, raw: &str) -> BTreeMap<String, String> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .unwrap_or_else(|e| panic!("{key} must be a JSON object: {e}"));
    let serde_json::Value::Object(map) = value else {
        panic!("{key} must be a JSON object");
    };
    map.into_iter()
        .map(|(k, v)| {
            let v = match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (k, v)
        })
        .collect()
}

impl AiConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                |
    /// |--------------------------------|------------------------|
    /// | `OPENAI_ENABLE_IMAGE_SERVICES` | `true`                 |
    /// | `OPENAI_REQUEST_TIMEOUT`       | `300`                  |
    /// | `OPENAI_CUSTOM_HEADERS`        | `{}`                   |
    /// | `OPENAI_CUSTOM_PARAMS`         | `{}`                   |
    /// | `GOOGLE_IMAGE_MODEL`           | --                     |
    /// | `GOOGLE_BASE_URL`              | public v1beta endpoint |
    /// | `AI_PROMPTS_DIR`               | bundled templates      |
    /// | `AI_WATERMARK_PATH`            | bundled badge          |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let enable_image_services = get("OPENAI_ENABLE_IMAGE_SERVICES")
            .map(|v| {
                v.trim()
                    .to_ascii_lowercase()
                    .parse::<bool>()
                    .expect("OPENAI_ENABLE_IMAGE_SERVICES must be true or false")
            })
            .unwrap_or(true);

        let request_timeout_secs: u64 = get("OPENAI_REQUEST_TIMEOUT")
            .unwrap_or_else(|| "300".into())
            .trim()
            .parse()
            .expect("OPENAI_REQUEST_TIMEOUT must be a valid u64");

        let custom_headers = get("OPENAI_CUSTOM_HEADERS")
            .map(|raw| parse_string_map("OPENAI_CUSTOM_HEADERS", &raw))
            .unwrap_or_default();
        let custom_params = get("OPENAI_CUSTOM_PARAMS")
            .map(|raw| parse_string_map("OPENAI_CUSTOM_PARAMS", &raw))
            .unwrap_or_default();

        Self {
            enable_image_services,
            request_timeout_secs,
            custom_headers,
            custom_params,
            google_image_model: get("GOOGLE_IMAGE_MODEL"),
            google_base_url: get("GOOGLE_BASE_URL"),
            prompts_dir: get("AI_PROMPTS_DIR").map(PathBuf::from),
            watermark_path: get("AI_WATERMARK_PATH").map(PathBuf::from),
        }
    }

    /// HTTP client shared by the providers, with the configured timeout.
    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .build()
    }
}
