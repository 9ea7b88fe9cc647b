//! Seams between the workflows and their collaborators.
//!
//! The workflows only see these traits. Production wires them to
//! PostgreSQL and the AI service; tests substitute in-memory doubles.

use async_trait::async_trait;
use mealie_ai::AiService;
use mealie_core::report::{ReportEntryDraft, ReportStatus};
use mealie_core::types::DbId;

use crate::error::PipelineError;

/// Minimal recipe identity, as returned by enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeRef {
    pub id: DbId,
    pub slug: String,
    pub name: String,
}

/// Everything needed to build a prompt and store an image for a recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeForImage {
    pub id: DbId,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    /// Image extension recorded in the database, which may be stale.
    pub image: Option<String>,
    pub ingredient_notes: Vec<Option<String>>,
}

#[async_trait]
pub trait RecipeSource: Send + Sync {
    /// Every recipe, in a stable order.
    async fn list_recipes(&self) -> Result<Vec<RecipeRef>, PipelineError>;

    /// Full recipe by id. `None` if it was deleted since enumeration.
    async fn load_recipe(&self, id: DbId) -> Result<Option<RecipeForImage>, PipelineError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<RecipeForImage>, PipelineError>;

    /// Record the extension of the newly stored image.
    async fn set_image(&self, id: DbId, extension: &str) -> Result<(), PipelineError>;
}

#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Create a report in the `in_progress` state and return its id.
    async fn start_report(&self, name: &str, category: &str) -> Result<DbId, PipelineError>;

    /// Persist every entry and the terminal status in one pass.
    async fn finalize_report(
        &self,
        report_id: DbId,
        entries: &[ReportEntryDraft],
        status: ReportStatus,
    ) -> Result<(), PipelineError>;
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate an image for `prompt`. `None` when nothing was produced.
    async fn generate_image(&self, prompt: &str) -> Result<Option<Vec<u8>>, PipelineError>;
}

#[async_trait]
impl ImageGenerator for AiService {
    async fn generate_image(&self, prompt: &str) -> Result<Option<Vec<u8>>, PipelineError> {
        Ok(AiService::generate_image(self, prompt).await?)
    }
}
