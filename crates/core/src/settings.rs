//! Site settings layering.
//!
//! Administrators can override AI and SMTP configuration at runtime through
//! the persisted `site_settings` row. Every configurable is resolved field by
//! field: a non-empty persisted value wins, otherwise the process default
//! (environment) applies, otherwise the value is absent.
//!
//! Both layers are the same plain [`SettingsLayer`] record; resolution is a
//! borrow over the two and never writes to either.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Placeholder returned in place of stored secrets, and accepted on update
/// as "leave this field unchanged".
pub const MASKED_SECRET: &str = "*****";

/// Provider name for OpenAI.
pub const PROVIDER_OPENAI: &str = "openai";

/// Provider name for Google Gemini.
pub const PROVIDER_GOOGLE: &str = "google";

/// Default OpenAI chat model when `OPENAI_MODEL` is not set.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Default Gemini model when `GOOGLE_MODEL` is not set.
pub const DEFAULT_GOOGLE_MODEL: &str = "gemini-pro";

// ---------------------------------------------------------------------------
// Provider kind
// ---------------------------------------------------------------------------

/// The AI vendors the backend can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProviderKind {
    OpenAi,
    Google,
}

impl AiProviderKind {
    /// Parse a provider name as stored in settings.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            PROVIDER_OPENAI => Some(Self::OpenAi),
            PROVIDER_GOOGLE => Some(Self::Google),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::OpenAi => PROVIDER_OPENAI,
            Self::Google => PROVIDER_GOOGLE,
        }
    }
}

impl std::fmt::Display for AiProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Decide which provider actually serves requests.
///
/// Google is only used when it was requested and its API key resolved to a
/// non-empty value; every other combination lands on OpenAI.
pub fn select_provider(requested: AiProviderKind, google_api_key: Option<&str>) -> AiProviderKind {
    match (requested, google_api_key) {
        (AiProviderKind::Google, Some(key)) if !key.trim().is_empty() => AiProviderKind::Google,
        _ => AiProviderKind::OpenAi,
    }
}

// ---------------------------------------------------------------------------
// SettingsLayer
// ---------------------------------------------------------------------------

/// One layer of site settings: either the persisted row or the process
/// defaults loaded from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsLayer {
    pub ai_provider: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub openai_base_url: Option<String>,
    pub google_api_key: Option<String>,
    pub google_model: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from_name: Option<String>,
    pub smtp_from_email: Option<String>,
    pub smtp_auth_strategy: Option<String>,
}

impl SettingsLayer {
    /// Load the process-default layer from environment variables.
    ///
    /// | Env Var              | Default       |
    /// |----------------------|---------------|
    /// | `AI_PROVIDER`        | --            |
    /// | `OPENAI_API_KEY`     | --            |
    /// | `OPENAI_MODEL`       | `gpt-4o`      |
    /// | `OPENAI_BASE_URL`    | --            |
    /// | `GOOGLE_API_KEY`     | --            |
    /// | `GOOGLE_MODEL`       | `gemini-pro`  |
    /// | `SMTP_HOST`          | --            |
    /// | `SMTP_PORT`          | --            |
    /// | `SMTP_USER`          | --            |
    /// | `SMTP_PASSWORD`      | --            |
    /// | `SMTP_FROM_NAME`     | --            |
    /// | `SMTP_FROM_EMAIL`    | --            |
    /// | `SMTP_AUTH_STRATEGY` | --            |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the default layer from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let smtp_port = get("SMTP_PORT").map(|p| {
            p.trim()
                .parse::<u16>()
                .expect("SMTP_PORT must be a valid u16")
        });

        Self {
            ai_provider: get("AI_PROVIDER"),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: Some(get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.into())),
            openai_base_url: get("OPENAI_BASE_URL"),
            google_api_key: get("GOOGLE_API_KEY"),
            google_model: Some(get("GOOGLE_MODEL").unwrap_or_else(|| DEFAULT_GOOGLE_MODEL.into())),
            smtp_host: get("SMTP_HOST"),
            smtp_port,
            smtp_user: get("SMTP_USER"),
            smtp_password: get("SMTP_PASSWORD"),
            smtp_from_name: get("SMTP_FROM_NAME"),
            smtp_from_email: get("SMTP_FROM_EMAIL"),
            smtp_auth_strategy: get("SMTP_AUTH_STRATEGY"),
        }
    }

    /// Copy of this layer with every non-empty secret replaced by
    /// [`MASKED_SECRET`]. Blank secrets stay blank.
    pub fn masked(&self) -> Self {
        let mask = |v: &Option<String>| match v {
            Some(secret) if !secret.is_empty() => Some(MASKED_SECRET.to_string()),
            other => other.clone(),
        };
        Self {
            openai_api_key: mask(&self.openai_api_key),
            google_api_key: mask(&self.google_api_key),
            smtp_user: mask(&self.smtp_user),
            smtp_password: mask(&self.smtp_password),
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// SettingsUpdate
// ---------------------------------------------------------------------------

/// Body of a settings update.
///
/// Each field distinguishes three states: absent (unchanged), `null`
/// (cleared) and a value (set). String values equal to [`MASKED_SECRET`]
/// are treated as unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default, deserialize_with = "explicit")]
    pub ai_provider: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub openai_api_key: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub openai_model: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub openai_base_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub google_api_key: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub google_model: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub smtp_host: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub smtp_port: Option<Option<u16>>,
    #[serde(default, deserialize_with = "explicit")]
    pub smtp_user: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub smtp_password: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub smtp_from_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub smtp_from_email: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub smtp_auth_strategy: Option<Option<String>>,
}

/// Map a present field (including `null`) to `Some`, so that a missing
/// field stays `None` via `#[serde(default)]`.
fn explicit<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn apply_text(target: &mut Option<String>, update: &Option<Option<String>>) {
    match update {
        None => {}
        Some(Some(value)) if value == MASKED_SECRET => {}
        Some(value) => *target = value.clone(),
    }
}

impl SettingsUpdate {
    /// Reject provider names the backend does not know.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(Some(provider)) = &self.ai_provider {
            if provider != MASKED_SECRET
                && !provider.trim().is_empty()
                && AiProviderKind::from_name(provider).is_none()
            {
                return Err(CoreError::Validation(format!(
                    "Unknown AI provider '{provider}'. Must be one of: {PROVIDER_OPENAI}, {PROVIDER_GOOGLE}"
                )));
            }
        }
        Ok(())
    }

    /// Apply this update onto a persisted layer.
    pub fn apply_to(&self, layer: &mut SettingsLayer) {
        apply_text(&mut layer.ai_provider, &self.ai_provider);
        apply_text(&mut layer.openai_api_key, &self.openai_api_key);
        apply_text(&mut layer.openai_model, &self.openai_model);
        apply_text(&mut layer.openai_base_url, &self.openai_base_url);
        apply_text(&mut layer.google_api_key, &self.google_api_key);
        apply_text(&mut layer.google_model, &self.google_model);
        apply_text(&mut layer.smtp_host, &self.smtp_host);
        if let Some(port) = self.smtp_port {
            layer.smtp_port = port;
        }
        apply_text(&mut layer.smtp_user, &self.smtp_user);
        apply_text(&mut layer.smtp_password, &self.smtp_password);
        apply_text(&mut layer.smtp_from_name, &self.smtp_from_name);
        apply_text(&mut layer.smtp_from_email, &self.smtp_from_email);
        apply_text(&mut layer.smtp_auth_strategy, &self.smtp_auth_strategy);
    }
}

// ---------------------------------------------------------------------------
// Effective settings
// ---------------------------------------------------------------------------

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Read-only merge of a persisted layer over the process defaults.
#[derive(Debug, Clone, Copy)]
pub struct EffectiveSettings<'a> {
    persisted: &'a SettingsLayer,
    defaults: &'a SettingsLayer,
}

impl<'a> EffectiveSettings<'a> {
    pub fn new(persisted: &'a SettingsLayer, defaults: &'a SettingsLayer) -> Self {
        Self {
            persisted,
            defaults,
        }
    }

    fn pick(&self, field: impl Fn(&SettingsLayer) -> &Option<String>) -> Option<&'a str> {
        let persisted: &'a SettingsLayer = self.persisted;
        let defaults: &'a SettingsLayer = self.defaults;
        non_empty(field(persisted)).or_else(|| non_empty(field(defaults)))
    }

    /// Requested provider. Unknown or missing names resolve to OpenAI.
    pub fn ai_provider(&self) -> AiProviderKind {
        self.pick(|l| &l.ai_provider)
            .and_then(AiProviderKind::from_name)
            .unwrap_or(AiProviderKind::OpenAi)
    }

    pub fn openai_api_key(&self) -> Option<&'a str> {
        self.pick(|l| &l.openai_api_key)
    }

    pub fn openai_model(&self) -> Option<&'a str> {
        self.pick(|l| &l.openai_model)
    }

    pub fn openai_base_url(&self) -> Option<&'a str> {
        self.pick(|l| &l.openai_base_url)
    }

    pub fn google_api_key(&self) -> Option<&'a str> {
        self.pick(|l| &l.google_api_key)
    }

    pub fn google_model(&self) -> Option<&'a str> {
        self.pick(|l| &l.google_model)
    }

    pub fn smtp(&self) -> SmtpSettings {
        let owned = |v: Option<&str>| v.map(str::to_string);
        SmtpSettings {
            host: owned(self.pick(|l| &l.smtp_host)),
            port: self.persisted.smtp_port.or(self.defaults.smtp_port),
            user: owned(self.pick(|l| &l.smtp_user)),
            password: owned(self.pick(|l| &l.smtp_password)),
            from_name: owned(self.pick(|l| &l.smtp_from_name)),
            from_email: owned(self.pick(|l| &l.smtp_from_email)),
            auth_strategy: owned(self.pick(|l| &l.smtp_auth_strategy)),
        }
    }

    /// Owned snapshot of every AI-related value, for handing to services
    /// that outlive the borrowed layers.
    pub fn resolve(&self) -> ResolvedSettings {
        ResolvedSettings {
            ai_provider: self.ai_provider(),
            openai_api_key: self.openai_api_key().map(str::to_string),
            openai_model: self
                .openai_model()
                .unwrap_or(DEFAULT_OPENAI_MODEL)
                .to_string(),
            openai_base_url: self.openai_base_url().map(str::to_string),
            google_api_key: self.google_api_key().map(str::to_string),
            google_model: self
                .google_model()
                .unwrap_or(DEFAULT_GOOGLE_MODEL)
                .to_string(),
        }
    }
}

/// Effective AI settings for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
    pub ai_provider: AiProviderKind,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub google_api_key: Option<String>,
    pub google_model: String,
}

/// Effective SMTP settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from_name: Option<String>,
    pub from_email: Option<String>,
    pub auth_strategy: Option<String>,
}

impl SmtpSettings {
    /// Email is usable once both host and port are known.
    pub fn is_ready(&self) -> bool {
        self.host.is_some() && self.port.is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
