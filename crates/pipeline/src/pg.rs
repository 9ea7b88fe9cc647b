//! PostgreSQL-backed implementations of the workflow ports.

use async_trait::async_trait;
use mealie_core::error::CoreError;
use mealie_core::report::{ReportEntryDraft, ReportStatus};
use mealie_core::types::DbId;
use mealie_db::models::recipe::Recipe;
use mealie_db::models::report::CreateReport;
use mealie_db::repositories::{RecipeRepo, ReportRepo};
use sqlx::PgPool;

use crate::error::PipelineError;
use crate::ports::{RecipeForImage, RecipeRef, RecipeSource, ReportSink};

/// Recipe access through [`RecipeRepo`].
#[derive(Debug, Clone)]
pub struct PgRecipeSource {
    pool: PgPool,
}

impl PgRecipeSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_ingredients(&self, recipe: Recipe) -> Result<RecipeForImage, PipelineError> {
        let ingredient_notes = RecipeRepo::list_ingredient_notes(&self.pool, recipe.id).await?;
        Ok(RecipeForImage {
            id: recipe.id,
            slug: recipe.slug,
            name: recipe.name,
            description: recipe.description,
            image: recipe.image,
            ingredient_notes,
        })
    }
}

#[async_trait]
impl RecipeSource for PgRecipeSource {
    async fn list_recipes(&self) -> Result<Vec<RecipeRef>, PipelineError> {
        let recipes = RecipeRepo::list_all(&self.pool).await?;
        Ok(recipes
            .into_iter()
            .map(|r| RecipeRef {
                id: r.id,
                slug: r.slug,
                name: r.name,
            })
            .collect())
    }

    async fn load_recipe(&self, id: DbId) -> Result<Option<RecipeForImage>, PipelineError> {
        match RecipeRepo::find_by_id(&self.pool, id).await? {
            Some(recipe) => Ok(Some(self.with_ingredients(recipe).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<RecipeForImage>, PipelineError> {
        match RecipeRepo::find_by_slug(&self.pool, slug).await? {
            Some(recipe) => Ok(Some(self.with_ingredients(recipe).await?)),
            None => Ok(None),
        }
    }

    async fn set_image(&self, id: DbId, extension: &str) -> Result<(), PipelineError> {
        if RecipeRepo::update_image(&self.pool, id, extension).await? {
            Ok(())
        } else {
            Err(CoreError::NotFound {
                entity: "Recipe",
                key: id.to_string(),
            }
            .into())
        }
    }
}

/// Report persistence through [`ReportRepo`].
#[derive(Debug, Clone)]
pub struct PgReportSink {
    pool: PgPool,
}

impl PgReportSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportSink for PgReportSink {
    async fn start_report(&self, name: &str, category: &str) -> Result<DbId, PipelineError> {
        let report = ReportRepo::create(
            &self.pool,
            &CreateReport {
                name: name.to_string(),
                category: category.to_string(),
                status: ReportStatus::InProgress,
            },
        )
        .await?;
        Ok(report.id)
    }

    async fn finalize_report(
        &self,
        report_id: DbId,
        entries: &[ReportEntryDraft],
        status: ReportStatus,
    ) -> Result<(), PipelineError> {
        if ReportRepo::finalize(&self.pool, report_id, entries, status).await? {
            Ok(())
        } else {
            Err(CoreError::Conflict(format!(
                "Report {report_id} is missing or already finalized"
            ))
            .into())
        }
    }
}
