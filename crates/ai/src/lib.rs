//! AI provider integration for recipe services.
//!
//! [`AiService`] is the entry point: it picks a provider from the resolved
//! site settings, loads prompt templates, forwards requests and
//! post-processes generated images.

pub mod config;
pub mod error;
pub mod google;
pub mod openai;
pub mod prompts;
pub mod provider;
pub mod service;
pub mod types;

pub use config::AiConfig;
pub use error::AiError;
pub use provider::AiProvider;
pub use service::AiService;
pub use types::{AiImage, DataInjection};
