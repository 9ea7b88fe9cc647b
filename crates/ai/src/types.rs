//! Request inputs: data injections appended to prompts, and image inputs
//! attached to user messages.

use std::io::Cursor;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use serde::Serialize;

use crate::error::AiError;

// ---------------------------------------------------------------------------
// Data injections
// ---------------------------------------------------------------------------

/// Types that can describe their own JSON schema to a model.
pub trait PromptSchema {
    fn json_schema() -> serde_json::Value;
}

/// A described block of data appended to a prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataInjection {
    pub description: String,
    pub value: String,
}

fn is_empty_value(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Array(a) => a.is_empty(),
        serde_json::Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

impl DataInjection {
    /// Inject a string verbatim.
    pub fn text(
        description: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, AiError> {
        let description = description.into();
        let value = value.into();
        if value.is_empty() {
            return Err(AiError::EmptyInjection(description));
        }
        Ok(Self { description, value })
    }

    /// Inject a serializable value as compact JSON. Strings are kept verbatim.
    pub fn json<T: Serialize + ?Sized>(
        description: impl Into<String>,
        value: &T,
    ) -> Result<Self, AiError> {
        let description = description.into();
        let value = serde_json::to_value(value)?;
        if is_empty_value(&value) {
            return Err(AiError::EmptyInjection(description));
        }
        let value = match value {
            serde_json::Value::String(s) => s,
            other => serde_json::to_string(&other)?,
        };
        Ok(Self { description, value })
    }

    /// Inject the JSON schema of `T`.
    pub fn schema<T: PromptSchema>(description: impl Into<String>) -> Result<Self, AiError> {
        Self::json(description, &T::json_schema())
    }
}

// ---------------------------------------------------------------------------
// Image inputs
// ---------------------------------------------------------------------------

/// An image attached to a user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiImage {
    /// Publicly reachable URL, passed through unchanged.
    External { url: String },
    /// File on local disk, re-encoded to JPEG and sent inline.
    Local { filename: String, path: PathBuf },
}

impl AiImage {
    pub fn external(url: impl Into<String>) -> Self {
        Self::External { url: url.into() }
    }

    pub fn local(filename: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Local {
            filename: filename.into(),
            path: path.into(),
        }
    }

    /// URL to hand to the model: the external URL, or a
    /// `data:image/jpeg;base64,...` URL for local files.
    pub async fn image_url(&self) -> Result<String, AiError> {
        match self {
            Self::External { url } => Ok(url.clone()),
            Self::Local { filename, path } => {
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    AiError::ImageInput(format!("{filename} ({}): {e}", path.display()))
                })?;
                let jpeg = tokio::task::spawn_blocking(move || to_jpeg(&bytes))
                    .await
                    .map_err(|e| AiError::ImageInput(e.to_string()))??;
                Ok(format!("data:image/jpeg;base64,{}", BASE64.encode(jpeg)))
            }
        }
    }

    /// OpenAI-style `image_url` content part.
    pub async fn content_part(&self) -> Result<serde_json::Value, AiError> {
        Ok(serde_json::json!({
            "type": "image_url",
            "image_url": { "url": self.image_url().await? },
        }))
    }
}

fn to_jpeg(bytes: &[u8]) -> Result<Vec<u8>, AiError> {
    let rgb = image::load_from_memory(bytes)
        .map_err(|e| AiError::ImageInput(e.to_string()))?
        .into_rgb8();
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new(&mut out)
        .encode_image(&rgb)
        .map_err(|e| AiError::ImageInput(e.to_string()))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;

    #[derive(Serialize)]
    struct Ingredient {
        note: String,
        quantity: f32,
    }

    struct IngredientSchema;

    impl PromptSchema for IngredientSchema {
        fn json_schema() -> serde_json::Value {
            serde_json::json!({ "type": "object", "properties": { "note": { "type": "string" } } })
        }
    }

    #[test]
    fn text_is_verbatim() {
        let injection = DataInjection::text("Recipe text", "2 cups flour").unwrap();
        assert_eq!(injection.value, "2 cups flour");
    }

    #[test]
    fn empty_text_is_rejected() {
        assert_matches!(
            DataInjection::text("Recipe text", ""),
            Err(AiError::EmptyInjection(d)) if d == "Recipe text"
        );
    }

    #[test]
    fn serializable_value_is_compact_json() {
        let injection = DataInjection::json(
            "Ingredient",
            &Ingredient {
                note: "flour".into(),
                quantity: 2.0,
            },
        )
        .unwrap();
        assert_eq!(injection.value, r#"{"note":"flour","quantity":2.0}"#);
    }

    #[test]
    fn empty_collections_are_rejected() {
        assert_matches!(
            DataInjection::json("Tags", &Vec::<String>::new()),
            Err(AiError::EmptyInjection(_))
        );
        assert_matches!(
            DataInjection::json("Nothing", &Option::<String>::None),
            Err(AiError::EmptyInjection(_))
        );
    }

    #[test]
    fn schema_injection_uses_the_type_schema() {
        let injection = DataInjection::schema::<IngredientSchema>("Schema").unwrap();
        assert!(injection.value.starts_with('{'));
        assert!(injection.value.contains(r#""note":{"type":"string"}"#));
    }

    #[tokio::test]
    async fn external_url_passes_through() {
        let image = AiImage::external("https://example.com/pancakes.png");
        assert_eq!(
            image.image_url().await.unwrap(),
            "https://example.com/pancakes.png"
        );
    }

    #[tokio::test]
    async fn local_image_becomes_jpeg_data_url() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("original.png");
        RgbImage::from_pixel(16, 16, Rgb([10, 200, 10]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let url = AiImage::local("original", &path).image_url().await.unwrap();
        let encoded = url.strip_prefix("data:image/jpeg;base64,").unwrap();
        let bytes = BASE64.decode(encoded).unwrap();
        assert!(bytes.starts_with(&[0xFF, 0xD8, 0xFF]));
    }

    #[tokio::test]
    async fn missing_local_image_is_an_error() {
        let image = AiImage::local("ghost", "/nonexistent/ghost.png");
        assert_matches!(image.image_url().await, Err(AiError::ImageInput(_)));
    }

    #[tokio::test]
    async fn content_part_shape() {
        let part = AiImage::external("https://example.com/a.jpg")
            .content_part()
            .await
            .unwrap();
        assert_eq!(part["type"], "image_url");
        assert_eq!(part["image_url"]["url"], "https://example.com/a.jpg");
    }
}
