//! Repository for the singleton `site_settings` row.

use mealie_core::settings::SettingsLayer;
use sqlx::PgPool;

use crate::models::site_settings::SiteSettings;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, ai_provider, openai_api_key, openai_model, openai_base_url, \
    google_api_key, google_model, smtp_host, smtp_port, smtp_user, smtp_password, \
    smtp_from_name, smtp_from_email, smtp_auth_strategy, created_at, updated_at";

/// Provides read and upsert access to the persisted settings layer.
pub struct SiteSettingsRepo;

impl SiteSettingsRepo {
    /// Fetch the settings row, creating an empty one on first access.
    pub async fn get(pool: &PgPool) -> Result<SiteSettings, sqlx::Error> {
        sqlx::query("INSERT INTO site_settings (id) VALUES (1) ON CONFLICT (id) DO NOTHING")
            .execute(pool)
            .await?;

        let query = format!("SELECT {COLUMNS} FROM site_settings WHERE id = 1");
        sqlx::query_as::<_, SiteSettings>(&query)
            .fetch_one(pool)
            .await
    }

    /// Fetch the persisted layer. An absent row reads as an empty layer.
    pub async fn get_layer(pool: &PgPool) -> Result<SettingsLayer, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM site_settings WHERE id = 1");
        let row = sqlx::query_as::<_, SiteSettings>(&query)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(SettingsLayer::from).unwrap_or_default())
    }

    /// Overwrite every column of the settings row with `layer`.
    pub async fn save(pool: &PgPool, layer: &SettingsLayer) -> Result<SiteSettings, sqlx::Error> {
        let query = format!(
            "INSERT INTO site_settings
                (id, ai_provider, openai_api_key, openai_model, openai_base_url,
                 google_api_key, google_model, smtp_host, smtp_port, smtp_user,
                 smtp_password, smtp_from_name, smtp_from_email, smtp_auth_strategy)
             VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             ON CONFLICT (id) DO UPDATE SET
                ai_provider = EXCLUDED.ai_provider,
                openai_api_key = EXCLUDED.openai_api_key,
                openai_model = EXCLUDED.openai_model,
                openai_base_url = EXCLUDED.openai_base_url,
                google_api_key = EXCLUDED.google_api_key,
                google_model = EXCLUDED.google_model,
                smtp_host = EXCLUDED.smtp_host,
                smtp_port = EXCLUDED.smtp_port,
                smtp_user = EXCLUDED.smtp_user,
                smtp_password = EXCLUDED.smtp_password,
                smtp_from_name = EXCLUDED.smtp_from_name,
                smtp_from_email = EXCLUDED.smtp_from_email,
                smtp_auth_strategy = EXCLUDED.smtp_auth_strategy,
                updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SiteSettings>(&query)
            .bind(&layer.ai_provider)
            .bind(&layer.openai_api_key)
            .bind(&layer.openai_model)
            .bind(&layer.openai_base_url)
            .bind(&layer.google_api_key)
            .bind(&layer.google_model)
            .bind(&layer.smtp_host)
            .bind(layer.smtp_port.map(i32::from))
            .bind(&layer.smtp_user)
            .bind(&layer.smtp_password)
            .bind(&layer.smtp_from_name)
            .bind(&layer.smtp_from_email)
            .bind(&layer.smtp_auth_strategy)
            .fetch_one(pool)
            .await
    }
}
