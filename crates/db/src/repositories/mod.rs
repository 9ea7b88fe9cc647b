//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod recipe_repo;
pub mod report_repo;
pub mod site_settings_repo;

pub use recipe_repo::RecipeRepo;
pub use report_repo::{ReportEntryRepo, ReportRepo};
pub use site_settings_repo::SiteSettingsRepo;
