//! Batch AI image generation for recipes missing an image.
//!
//! The report is created up front so callers get an id immediately; the
//! scan then runs (typically in a background task) and finalizes the
//! report once every recipe has been processed.

use std::sync::Arc;

use mealie_core::report::{
    aggregate_status, ReportEntryDraft, ReportStatus, BATCH_IMAGE_REPORT_NAME,
    CATEGORY_AI_IMAGE_GENERATION,
};
use mealie_core::types::DbId;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::PipelineError;
use crate::ports::{RecipeForImage, RecipeRef, ReportSink};
use crate::recipe_image::ImagePipeline;

/// Maximum number of recipes processed at the same time.
pub const MAX_CONCURRENT_GENERATIONS: usize = 3;

/// Scans all recipes and generates images where none is stored.
#[derive(Clone)]
pub struct BatchImageJob {
    pipeline: ImagePipeline,
    reports: Arc<dyn ReportSink>,
}

impl BatchImageJob {
    pub fn new(pipeline: ImagePipeline, reports: Arc<dyn ReportSink>) -> Self {
        Self { pipeline, reports }
    }

    /// Create the `in_progress` report for a new run.
    pub async fn start_report(&self) -> Result<DbId, PipelineError> {
        self.reports
            .start_report(BATCH_IMAGE_REPORT_NAME, CATEGORY_AI_IMAGE_GENERATION)
            .await
    }

    /// Process every recipe and finalize `report_id` with the collected
    /// entries. Per-recipe failures become report entries, not errors.
    pub async fn run(&self, report_id: DbId) -> Result<ReportStatus, PipelineError> {
        let entries = match self.pipeline.recipes().list_recipes().await {
            Ok(recipes) if recipes.is_empty() => {
                vec![ReportEntryDraft::success("No recipes found to process")]
            }
            Ok(recipes) => {
                tracing::info!(report_id, count = recipes.len(), "Scanning recipes for missing images");
                self.process_all(recipes).await
            }
            Err(e) => {
                tracing::error!(report_id, error = %e, "Failed to enumerate recipes");
                vec![ReportEntryDraft::failure(
                    "Batch image generation failed",
                    e.to_string(),
                )]
            }
        };

        let status = aggregate_status(&entries);
        self.reports
            .finalize_report(report_id, &entries, status)
            .await?;

        tracing::info!(
            report_id,
            status = status.as_str(),
            entries = entries.len(),
            "Batch image generation finished"
        );
        Ok(status)
    }

    /// One task per recipe, at most [`MAX_CONCURRENT_GENERATIONS`] holding a
    /// permit. Entries come back in enumeration order.
    async fn process_all(&self, recipes: Vec<RecipeRef>) -> Vec<ReportEntryDraft> {
        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_GENERATIONS));
        let mut tasks = JoinSet::new();

        for (index, recipe) in recipes.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let pipeline = self.pipeline.clone();
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return (index, Some(failure_entry(&recipe, e.to_string())));
                    }
                };
                (index, process_recipe(&pipeline, &recipe).await)
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Some(entry))) => outcomes.push((index, entry)),
                Ok((_, None)) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Image generation task panicked");
                    outcomes.push((
                        usize::MAX,
                        ReportEntryDraft::failure("Image generation task failed", e.to_string()),
                    ));
                }
            }
        }

        outcomes.sort_by_key(|(index, _)| *index);
        outcomes.into_iter().map(|(_, entry)| entry).collect()
    }
}

fn failure_entry(recipe: &RecipeRef, error: String) -> ReportEntryDraft {
    ReportEntryDraft::failure(
        format!(
            "Failed to generate image for recipe '{}' ({})",
            recipe.name, recipe.slug
        ),
        error,
    )
}

/// `None` when the recipe was skipped.
async fn process_recipe(pipeline: &ImagePipeline, recipe: &RecipeRef) -> Option<ReportEntryDraft> {
    match generate_if_missing(pipeline, recipe).await {
        Ok(Some(full)) => Some(ReportEntryDraft::success(format!(
            "Successfully generated AI image for recipe: {}",
            full.name
        ))),
        Ok(None) => None,
        Err(e) => {
            tracing::error!(slug = %recipe.slug, error = %e, "Failed to generate AI image for recipe");
            Some(failure_entry(recipe, e.to_string()))
        }
    }
}

async fn generate_if_missing(
    pipeline: &ImagePipeline,
    recipe: &RecipeRef,
) -> Result<Option<RecipeForImage>, PipelineError> {
    let Some(full) = pipeline.recipes().load_recipe(recipe.id).await? else {
        tracing::debug!(slug = %recipe.slug, "Recipe disappeared before processing");
        return Ok(None);
    };

    if pipeline.store().has_valid_image(full.id).await? {
        tracing::debug!(slug = %full.slug, "Skipping recipe, valid image exists on disk");
        return Ok(None);
    }
    if full.image.is_some() {
        tracing::info!(
            slug = %full.slug,
            "Recipe has an image recorded but no valid file on disk, generating a new one"
        );
    }

    pipeline.generate(&full, None).await?;
    Ok(Some(full))
}
