//! Single-recipe image generation.

use std::path::PathBuf;
use std::sync::Arc;

use mealie_core::error::CoreError;
use mealie_core::image_prompt::build_recipe_image_prompt;
use mealie_core::recipe_image::{extension_for_bytes, RecipeImageStore};

use crate::error::PipelineError;
use crate::ports::{ImageGenerator, RecipeForImage, RecipeSource};

/// Outcome of a successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub path: PathBuf,
    pub extension: &'static str,
}

/// Generates and stores images for individual recipes.
#[derive(Clone)]
pub struct ImagePipeline {
    recipes: Arc<dyn RecipeSource>,
    generator: Arc<dyn ImageGenerator>,
    store: RecipeImageStore,
}

impl ImagePipeline {
    pub fn new(
        recipes: Arc<dyn RecipeSource>,
        generator: Arc<dyn ImageGenerator>,
        store: RecipeImageStore,
    ) -> Self {
        Self {
            recipes,
            generator,
            store,
        }
    }

    pub fn recipes(&self) -> &dyn RecipeSource {
        self.recipes.as_ref()
    }

    pub fn store(&self) -> &RecipeImageStore {
        &self.store
    }

    /// Build the prompt, generate, write the image to disk and record its
    /// extension on the recipe.
    pub async fn generate(
        &self,
        recipe: &RecipeForImage,
        custom_text: Option<&str>,
    ) -> Result<GeneratedImage, PipelineError> {
        let prompt = build_recipe_image_prompt(
            &recipe.name,
            recipe.description.as_deref(),
            &recipe.ingredient_notes,
            custom_text,
        );
        tracing::debug!(recipe_id = recipe.id, slug = %recipe.slug, "Generating recipe image");

        let bytes = self
            .generator
            .generate_image(&prompt)
            .await?
            .ok_or(PipelineError::NoImageGenerated)?;
        let extension = extension_for_bytes(&bytes).ok_or(PipelineError::UnsupportedImage)?;

        let path = self.store.write_image(recipe.id, &bytes, extension).await?;
        self.recipes.set_image(recipe.id, extension).await?;

        tracing::info!(
            recipe_id = recipe.id,
            slug = %recipe.slug,
            path = %path.display(),
            "Stored generated recipe image"
        );
        Ok(GeneratedImage { path, extension })
    }

    async fn require_recipe(&self, slug: &str) -> Result<RecipeForImage, PipelineError> {
        self.recipes.find_by_slug(slug).await?.ok_or_else(|| {
            CoreError::NotFound {
                entity: "Recipe",
                key: slug.to_string(),
            }
            .into()
        })
    }

    /// Generate an image for a recipe that has no valid image on disk.
    pub async fn generate_for_slug(
        &self,
        slug: &str,
    ) -> Result<(RecipeForImage, GeneratedImage), PipelineError> {
        let recipe = self.require_recipe(slug).await?;
        if self.store.has_valid_image(recipe.id).await? {
            return Err(PipelineError::ImageExists(recipe.slug));
        }
        let image = self.generate(&recipe, None).await?;
        Ok((recipe, image))
    }

    /// Generate a new image unconditionally, replacing any stored one.
    pub async fn regenerate_for_slug(
        &self,
        slug: &str,
        custom_prompt: Option<&str>,
    ) -> Result<(RecipeForImage, GeneratedImage), PipelineError> {
        let recipe = self.require_recipe(slug).await?;
        let image = self.generate(&recipe, custom_prompt).await?;
        Ok((recipe, image))
    }
}
