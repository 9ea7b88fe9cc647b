//! In-memory doubles for the workflow ports.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use mealie_ai::AiError;
use mealie_core::error::CoreError;
use mealie_core::report::{ReportEntryDraft, ReportStatus};
use mealie_core::types::DbId;

use crate::error::PipelineError;
use crate::ports::{ImageGenerator, RecipeForImage, RecipeRef, RecipeSource, ReportSink};

/// Enough of a PNG header for format sniffing.
pub const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

/// Message carried by errors from [`FakeGenerator::erroring_on`].
pub const FAKE_PROVIDER_ERROR: &str = "quota exceeded for this billing period";

/// A recipe named after its slug with the first letter upper-cased.
pub fn recipe(id: DbId, slug: &str, image: Option<&str>) -> RecipeForImage {
    let mut name = slug.to_string();
    if let Some(first) = name.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    RecipeForImage {
        id,
        slug: slug.to_string(),
        name,
        description: None,
        image: image.map(str::to_string),
        ingredient_notes: vec![Some("salt".into())],
    }
}

// ---------------------------------------------------------------------------
// Recipes
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeRecipes {
    order: Vec<DbId>,
    recipes: Mutex<HashMap<DbId, RecipeForImage>>,
    refs: HashMap<DbId, RecipeRef>,
    pub fail_listing: AtomicBool,
}

impl FakeRecipes {
    pub fn with(recipes: Vec<RecipeForImage>) -> Self {
        let order = recipes.iter().map(|r| r.id).collect();
        let refs = recipes
            .iter()
            .map(|r| {
                (
                    r.id,
                    RecipeRef {
                        id: r.id,
                        slug: r.slug.clone(),
                        name: r.name.clone(),
                    },
                )
            })
            .collect();
        Self {
            order,
            recipes: Mutex::new(recipes.into_iter().map(|r| (r.id, r)).collect()),
            refs,
            fail_listing: AtomicBool::new(false),
        }
    }

    /// Delete the full record while keeping it in the listing.
    pub fn vanish(&self, id: DbId) {
        self.recipes.lock().unwrap().remove(&id);
    }

    pub fn image_of(&self, id: DbId) -> Option<String> {
        self.recipes.lock().unwrap().get(&id).and_then(|r| r.image.clone())
    }
}

#[async_trait]
impl RecipeSource for FakeRecipes {
    async fn list_recipes(&self) -> Result<Vec<RecipeRef>, PipelineError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(CoreError::Internal("connection reset".into()).into());
        }
        Ok(self.order.iter().map(|id| self.refs[id].clone()).collect())
    }

    async fn load_recipe(&self, id: DbId) -> Result<Option<RecipeForImage>, PipelineError> {
        Ok(self.recipes.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<RecipeForImage>, PipelineError> {
        Ok(self
            .recipes
            .lock()
            .unwrap()
            .values()
            .find(|r| r.slug == slug)
            .cloned())
    }

    async fn set_image(&self, id: DbId, extension: &str) -> Result<(), PipelineError> {
        let mut recipes = self.recipes.lock().unwrap();
        let recipe = recipes.get_mut(&id).ok_or_else(|| CoreError::NotFound {
            entity: "Recipe",
            key: id.to_string(),
        })?;
        recipe.image = Some(extension.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// What the generator does for a prompt matching its needle.
#[derive(Clone, Copy)]
enum Failure {
    /// Answers without an image.
    Empty,
    /// Returns a wrapped provider error.
    Error,
}

#[derive(Default)]
pub struct FakeGenerator {
    fail_on: Option<(String, Failure)>,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    pub peak: AtomicUsize,
}

impl FakeGenerator {
    /// Prompts containing `needle` produce no image.
    pub fn failing_on(needle: &str) -> Self {
        Self {
            fail_on: Some((needle.to_string(), Failure::Empty)),
            ..Self::default()
        }
    }

    /// Prompts containing `needle` fail with [`FAKE_PROVIDER_ERROR`].
    pub fn erroring_on(needle: &str) -> Self {
        Self {
            fail_on: Some((needle.to_string(), Failure::Error)),
            ..Self::default()
        }
    }

    pub fn slow() -> Self {
        Self {
            delay: Some(Duration::from_millis(20)),
            ..Self::default()
        }
    }
}

#[async_trait]
impl ImageGenerator for FakeGenerator {
    async fn generate_image(&self, prompt: &str) -> Result<Option<Vec<u8>>, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match &self.fail_on {
            Some((needle, Failure::Empty)) if prompt.contains(needle.as_str()) => Ok(None),
            Some((needle, Failure::Error)) if prompt.contains(needle.as_str()) => {
                Err(AiError::RequestFailed {
                    kind: "ApiError",
                    message: FAKE_PROVIDER_ERROR.to_string(),
                }
                .into())
            }
            _ => Ok(Some(PNG_MAGIC.to_vec())),
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

type Finalized = (DbId, Vec<ReportEntryDraft>, ReportStatus);

#[derive(Default)]
pub struct FakeReports {
    next_id: AtomicUsize,
    open: Mutex<Vec<DbId>>,
    finalized: Mutex<Vec<Finalized>>,
}

impl FakeReports {
    pub fn finalized(&self, report_id: DbId) -> Option<Finalized> {
        self.finalized
            .lock()
            .unwrap()
            .iter()
            .find(|(id, _, _)| *id == report_id)
            .cloned()
    }
}

#[async_trait]
impl ReportSink for FakeReports {
    async fn start_report(&self, _name: &str, _category: &str) -> Result<DbId, PipelineError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as DbId + 1;
        self.open.lock().unwrap().push(id);
        Ok(id)
    }

    async fn finalize_report(
        &self,
        report_id: DbId,
        entries: &[ReportEntryDraft],
        status: ReportStatus,
    ) -> Result<(), PipelineError> {
        let mut open = self.open.lock().unwrap();
        let Some(pos) = open.iter().position(|id| *id == report_id) else {
            return Err(CoreError::Conflict(format!("Report {report_id} already finalized")).into());
        };
        open.remove(pos);
        self.finalized
            .lock()
            .unwrap()
            .push((report_id, entries.to_vec(), status));
        Ok(())
    }
}
