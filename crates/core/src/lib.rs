//! Domain types, validation and pure logic shared by the backend crates.
//!
//! Nothing in here talks to the database or the network. Filesystem access
//! is limited to the recipe image store and the watermark badge.

pub mod error;
pub mod image_prompt;
pub mod recipe_image;
pub mod report;
pub mod settings;
pub mod types;
pub mod watermark;
