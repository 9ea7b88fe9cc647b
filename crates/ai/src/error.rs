//! Error type for the AI layer.

use mealie_core::settings::AiProviderKind;

/// Errors raised while preparing, sending or interpreting AI requests.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The vendor returned a non-2xx status code.
    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: AiProviderKind,
        status: u16,
        body: String,
    },

    /// The vendor response could not be interpreted.
    #[error("Failed to decode {provider} response: {message}")]
    Decode {
        provider: AiProviderKind,
        message: String,
    },

    /// The selected provider has no API key.
    #[error("No API key configured for AI provider '{provider}'")]
    MissingCredential { provider: AiProviderKind },

    #[error("Prompt name cannot be empty")]
    EmptyPromptName,

    #[error("Invalid prompt name '{0}'")]
    InvalidPromptName(String),

    #[error("Unable to load prompt {name}")]
    PromptNotFound {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A data injection was given an empty value.
    #[error("Value cannot be empty for data injection '{0}'")]
    EmptyInjection(String),

    /// A data injection value could not be serialized to JSON.
    #[error("Failed to serialize data injection: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A local image input could not be read or re-encoded.
    #[error("Failed to prepare image input: {0}")]
    ImageInput(String),

    /// Any failure raised by the provider layer, wrapped once by the service.
    #[error("AI Request Failed. {kind}: {message}")]
    RequestFailed { kind: &'static str, message: String },
}

impl AiError {
    /// Short name of the error kind, used when wrapping provider failures.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Request(_) => "RequestError",
            Self::Api { .. } => "ApiError",
            Self::Decode { .. } => "DecodeError",
            Self::MissingCredential { .. } => "MissingCredential",
            Self::EmptyPromptName | Self::InvalidPromptName(_) | Self::EmptyInjection(_) => {
                "ValidationError"
            }
            Self::PromptNotFound { .. } => "PromptNotFound",
            Self::Serialization(_) => "SerializationError",
            Self::ImageInput(_) => "ImageInputError",
            Self::RequestFailed { kind, .. } => kind,
        }
    }

    /// Wrap a provider-layer failure. Already wrapped errors pass through.
    pub fn wrap(self) -> Self {
        match self {
            Self::RequestFailed { .. } => self,
            other => Self::RequestFailed {
                kind: other.kind(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn wrapped_message_names_the_kind() {
        let err = AiError::ImageInput("unreadable".into()).wrap();
        assert_eq!(
            err.to_string(),
            "AI Request Failed. ImageInputError: Failed to prepare image input: unreadable"
        );
    }

    #[test]
    fn wrapping_twice_is_a_no_op() {
        let err = AiError::EmptyPromptName.wrap().wrap();
        assert_matches!(err, AiError::RequestFailed { kind: "ValidationError", .. });
    }
}
