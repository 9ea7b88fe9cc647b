//! Recipe image generation workflows.
//!
//! [`ImagePipeline`] generates an image for one recipe. [`BatchImageJob`]
//! scans every recipe, generates images for those without a valid one on
//! disk and records the outcome in a report.

pub mod batch;
pub mod error;
pub mod pg;
pub mod ports;
pub mod recipe_image;

pub use batch::{BatchImageJob, MAX_CONCURRENT_GENERATIONS};
pub use error::PipelineError;
pub use pg::{PgRecipeSource, PgReportSink};
pub use ports::{ImageGenerator, RecipeForImage, RecipeRef, RecipeSource, ReportSink};
pub use recipe_image::{GeneratedImage, ImagePipeline};

#[cfg(test)]
pub(crate) mod testing;
