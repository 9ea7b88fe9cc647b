//! Site settings row (singleton, `id = 1`).

use mealie_core::settings::SettingsLayer;
use mealie_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// The single row of the `site_settings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SiteSettings {
    pub id: DbId,
    pub ai_provider: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub openai_base_url: Option<String>,
    pub google_api_key: Option<String>,
    pub google_model: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<i32>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from_name: Option<String>,
    pub smtp_from_email: Option<String>,
    pub smtp_auth_strategy: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&SiteSettings> for SettingsLayer {
    fn from(row: &SiteSettings) -> Self {
        Self {
            ai_provider: row.ai_provider.clone(),
            openai_api_key: row.openai_api_key.clone(),
            openai_model: row.openai_model.clone(),
            openai_base_url: row.openai_base_url.clone(),
            google_api_key: row.google_api_key.clone(),
            google_model: row.google_model.clone(),
            smtp_host: row.smtp_host.clone(),
            // The column CHECK keeps this within u16.
            smtp_port: row.smtp_port.and_then(|p| u16::try_from(p).ok()),
            smtp_user: row.smtp_user.clone(),
            smtp_password: row.smtp_password.clone(),
            smtp_from_name: row.smtp_from_name.clone(),
            smtp_from_email: row.smtp_from_email.clone(),
            smtp_auth_strategy: row.smtp_auth_strategy.clone(),
        }
    }
}
