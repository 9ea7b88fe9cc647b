use std::sync::{Arc, Mutex};
use std::time::Duration;

use mealie_ai::{AiConfig, AiService};
use mealie_core::recipe_image::RecipeImageStore;
use mealie_core::settings::{EffectiveSettings, ResolvedSettings, SettingsLayer, SmtpSettings};
use mealie_db::repositories::SiteSettingsRepo;
use mealie_pipeline::{BatchImageJob, ImagePipeline, PgRecipeSource, PgReportSink};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: mealie_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// AI settings that are only configurable through the environment.
    pub ai_config: Arc<AiConfig>,
    /// Process-default site settings, read once at startup.
    pub settings_defaults: Arc<SettingsLayer>,
    /// HTTP client shared by the AI providers.
    pub http: reqwest::Client,
    /// Batch jobs still running after their request returned.
    pub background: BackgroundTasks,
}

impl AppState {
    /// Persisted site settings layer.
    pub async fn persisted_settings(&self) -> Result<SettingsLayer, sqlx::Error> {
        SiteSettingsRepo::get_layer(&self.pool).await
    }

    /// AI settings as they stand right now: persisted over defaults.
    pub async fn resolved_settings(&self) -> Result<ResolvedSettings, sqlx::Error> {
        let persisted = self.persisted_settings().await?;
        Ok(EffectiveSettings::new(&persisted, &self.settings_defaults).resolve())
    }

    pub async fn smtp_settings(&self) -> Result<SmtpSettings, sqlx::Error> {
        let persisted = self.persisted_settings().await?;
        Ok(EffectiveSettings::new(&persisted, &self.settings_defaults).smtp())
    }

    /// Build an AI service from freshly resolved settings.
    pub async fn ai_service(&self) -> Result<AiService, sqlx::Error> {
        let settings = self.resolved_settings().await?;
        Ok(AiService::new(&settings, &self.ai_config, self.http.clone()))
    }

    pub fn image_store(&self) -> RecipeImageStore {
        RecipeImageStore::new(self.config.data_dir.clone())
    }

    /// Image pipeline backed by PostgreSQL and the given AI service.
    pub fn image_pipeline(&self, ai: AiService) -> ImagePipeline {
        ImagePipeline::new(
            Arc::new(PgRecipeSource::new(self.pool.clone())),
            Arc::new(ai),
            self.image_store(),
        )
    }

    pub fn batch_image_job(&self, ai: AiService) -> BatchImageJob {
        BatchImageJob::new(
            self.image_pipeline(ai),
            Arc::new(PgReportSink::new(self.pool.clone())),
        )
    }
}

/// Detached tasks the server waits for (up to a deadline) on shutdown.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tasks: Arc<Mutex<tokio::task::JoinSet<()>>>,
}

impl BackgroundTasks {
    pub fn spawn<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        // Reap finished tasks so the set does not grow without bound.
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }

    /// Wait for every running task, aborting whatever is left at `timeout`.
    ///
    /// Returns the number of tasks that had to be aborted.
    pub async fn drain(&self, timeout: Duration) -> usize {
        let mut tasks = {
            let mut guard = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *guard)
        };

        let finished = tokio::time::timeout(timeout, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        if finished.is_ok() {
            0
        } else {
            let left = tasks.len();
            tasks.abort_all();
            left
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drain_waits_for_running_tasks() {
        let background = BackgroundTasks::default();
        let (tx, rx) = tokio::sync::oneshot::channel();
        background.spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = tx.send(());
        });

        assert_eq!(background.drain(Duration::from_secs(5)).await, 0);
        assert!(rx.await.is_ok());
    }

    #[tokio::test]
    async fn drain_aborts_after_timeout() {
        let background = BackgroundTasks::default();
        background.spawn(std::future::pending());

        assert_eq!(background.drain(Duration::from_millis(20)).await, 1);
    }
}
