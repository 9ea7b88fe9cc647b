//! On-disk recipe image store.
//!
//! Layout under the data directory:
//!
//! ```text
//! <data_dir>/recipes/<recipe_id>/images/original.<ext>
//! ```
//!
//! The database `recipes.image` column can disagree with the filesystem
//! (partial writes, files removed by hand), so validity is always checked
//! against the directory contents.

use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::types::DbId;

/// Extensions that count as a recipe image (compared lowercase).
pub const VALID_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// File stem of the canonical image in a recipe's image directory.
pub const ORIGINAL_IMAGE_STEM: &str = "original";

/// Whether `path` has an allowed image extension.
pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| VALID_IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// File extension for encoded image bytes, sniffed from the magic bytes.
///
/// Returns `None` for data that is not one of the allowed formats.
pub fn extension_for_bytes(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        ImageFormat::Png => Some("png"),
        ImageFormat::Jpeg => Some("jpg"),
        ImageFormat::WebP => Some("webp"),
        ImageFormat::Gif => Some("gif"),
        _ => None,
    }
}

/// Filesystem store for recipe images, rooted at the application data dir.
#[derive(Debug, Clone)]
pub struct RecipeImageStore {
    data_dir: PathBuf,
}

impl RecipeImageStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn recipe_dir(&self, recipe_id: DbId) -> PathBuf {
        self.data_dir.join("recipes").join(recipe_id.to_string())
    }

    pub fn image_dir(&self, recipe_id: DbId) -> PathBuf {
        self.recipe_dir(recipe_id).join("images")
    }

    /// First valid image in the recipe's image directory: a regular file
    /// with an allowed extension and a non-zero size.
    pub async fn find_valid_image(&self, recipe_id: DbId) -> std::io::Result<Option<PathBuf>> {
        let dir = self.image_dir(recipe_id);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !has_image_extension(&path) {
                continue;
            }
            let metadata = entry.metadata().await?;
            if metadata.is_file() && metadata.len() > 0 {
                tracing::debug!(recipe_id, path = %path.display(), "Found valid recipe image");
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    pub async fn has_valid_image(&self, recipe_id: DbId) -> std::io::Result<bool> {
        Ok(self.find_valid_image(recipe_id).await?.is_some())
    }

    /// Write `bytes` as the canonical `original.<ext>` image, removing any
    /// canonical image stored under a different extension.
    pub async fn write_image(
        &self,
        recipe_id: DbId,
        bytes: &[u8],
        ext: &str,
    ) -> std::io::Result<PathBuf> {
        let dir = self.image_dir(recipe_id);
        tokio::fs::create_dir_all(&dir).await?;

        let target = dir.join(format!("{ORIGINAL_IMAGE_STEM}.{ext}"));

        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_original = path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s == ORIGINAL_IMAGE_STEM);
            if is_original && path != target {
                tokio::fs::remove_file(&path).await?;
            }
        }

        tokio::fs::write(&target, bytes).await?;
        Ok(target)
    }
}
