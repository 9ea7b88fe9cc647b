//! Watermarking for AI-generated recipe images.
//!
//! Stamps a badge into the lower-right corner of an image. The output keeps
//! the broad format family of the input: JPEG bytes come back as JPEG,
//! anything else comes back as PNG with transparency preserved.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};

/// Default badge opacity.
pub const DEFAULT_OPACITY: f32 = 0.7;

/// Badge width as a fraction of the base image width.
const BADGE_WIDTH_RATIO: f32 = 0.15;

/// Margin between the badge and the right/bottom edges, in pixels.
const BADGE_PADDING: i64 = 20;

/// Quality for re-encoded JPEG output.
const JPEG_QUALITY: u8 = 95;

/// Badge bundled with the binary, used when no path is configured.
static DEFAULT_BADGE: &[u8] = include_bytes!("../assets/ai-watermark.png");

#[derive(Debug, thiserror::Error)]
pub enum WatermarkError {
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Failed to read watermark '{}': {source}", path.display())]
    Badge {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Whether the bytes start with the JPEG SOI marker.
pub fn is_jpeg(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0xFF, 0xD8, 0xFF])
}

fn load_badge(watermark_path: Option<&Path>) -> Result<RgbaImage, WatermarkError> {
    let badge = match watermark_path {
        Some(path) => {
            let bytes = std::fs::read(path).map_err(|source| WatermarkError::Badge {
                path: path.to_path_buf(),
                source,
            })?;
            image::load_from_memory(&bytes)?
        }
        None => image::load_from_memory_with_format(DEFAULT_BADGE, ImageFormat::Png)?,
    };
    Ok(badge.into_rgba8())
}

/// Composite the badge onto `image_bytes` and return newly encoded bytes.
///
/// `watermark_path` overrides the bundled badge. `opacity` is clamped to
/// `0.0..=1.0` and scales the badge's own alpha channel.
pub fn apply_watermark(
    image_bytes: &[u8],
    watermark_path: Option<&Path>,
    opacity: f32,
) -> Result<Vec<u8>, WatermarkError> {
    let mut base = image::load_from_memory(image_bytes)?.into_rgba8();
    let badge = load_badge(watermark_path)?;

    let (base_width, base_height) = base.dimensions();
    let badge_width = (base_width as f32 * BADGE_WIDTH_RATIO) as u32;
    let aspect = badge.height() as f32 / badge.width().max(1) as f32;
    let badge_height = (badge_width as f32 * aspect) as u32;

    // Tiny images get no badge but still go through re-encoding.
    if badge_width > 0 && badge_height > 0 {
        let mut badge = imageops::resize(&badge, badge_width, badge_height, FilterType::Lanczos3);

        let opacity = opacity.clamp(0.0, 1.0);
        if opacity < 1.0 {
            for pixel in badge.pixels_mut() {
                pixel[3] = (pixel[3] as f32 * opacity) as u8;
            }
        }

        let x = base_width as i64 - badge_width as i64 - BADGE_PADDING;
        let y = base_height as i64 - badge_height as i64 - BADGE_PADDING;
        imageops::overlay(&mut base, &badge, x, y);
    }

    let mut output = Vec::new();
    if is_jpeg(image_bytes) {
        let flattened = DynamicImage::ImageRgba8(base).into_rgb8();
        JpegEncoder::new_with_quality(&mut output, JPEG_QUALITY).encode_image(&flattened)?;
    } else {
        base.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage, Rgba};

    use super::*;

    fn solid_rgb(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([200, 40, 40]))
    }

    fn encode_png(img: &RgbImage) -> Vec<u8> {
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    fn encode_jpeg(img: &RgbImage) -> Vec<u8> {
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, 90)
            .encode_image(img)
            .unwrap();
        out
    }

    #[test]
    fn png_input_stays_png_and_changes() {
        let input = encode_png(&solid_rgb(400, 400));
        let output = apply_watermark(&input, None, DEFAULT_OPACITY).unwrap();

        assert_ne!(input, output);
        assert_eq!(image::guess_format(&output).unwrap(), ImageFormat::Png);

        let decoded = image::load_from_memory(&output).unwrap().into_rgba8();
        assert_eq!(decoded.dimensions(), (400, 400));
        // Badge is 60x60 at (320, 320); its centre differs from the base colour.
        assert_ne!(*decoded.get_pixel(350, 350), Rgba([200, 40, 40, 255]));
        // Top-left corner is untouched.
        assert_eq!(*decoded.get_pixel(5, 5), Rgba([200, 40, 40, 255]));
    }

    #[test]
    fn jpeg_input_stays_jpeg() {
        let input = encode_jpeg(&solid_rgb(320, 240));
        assert!(is_jpeg(&input));

        let output = apply_watermark(&input, None, DEFAULT_OPACITY).unwrap();

        assert_ne!(input, output);
        assert!(is_jpeg(&output));
        let decoded = image::load_from_memory(&output).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 240));
    }

    #[test]
    fn input_buffer_is_not_mutated() {
        let input = encode_png(&solid_rgb(200, 200));
        let snapshot = input.clone();
        let _ = apply_watermark(&input, None, 0.5).unwrap();
        assert_eq!(input, snapshot);
    }

    #[test]
    fn tiny_image_is_reencoded_without_badge() {
        let input = encode_png(&solid_rgb(4, 4));
        let output = apply_watermark(&input, None, DEFAULT_OPACITY).unwrap();
        let decoded = image::load_from_memory(&output).unwrap().into_rgba8();
        assert!(decoded.pixels().all(|p| *p == Rgba([200, 40, 40, 255])));
    }

    #[test]
    fn custom_badge_path_is_used() {
        let tmp = tempfile::tempdir().unwrap();
        let badge_path = tmp.path().join("badge.png");
        let badge = RgbaImage::from_pixel(10, 5, Rgba([0, 0, 255, 255]));
        badge.save(&badge_path).unwrap();

        let input = encode_png(&solid_rgb(400, 400));
        let output = apply_watermark(&input, Some(&badge_path), 1.0).unwrap();
        let decoded = image::load_from_memory(&output).unwrap().into_rgba8();

        // 60x30 badge at (320, 350), fully opaque blue.
        let Rgba([r, _, b, a]) = *decoded.get_pixel(350, 365);
        assert!(b > 240 && r < 15 && a == 255, "expected blue badge pixel, got {r},{b},{a}");
    }

    #[test]
    fn missing_badge_file_is_an_error() {
        let input = encode_png(&solid_rgb(100, 100));
        let err = apply_watermark(&input, Some(Path::new("/nonexistent/badge.png")), 0.7)
            .unwrap_err();
        assert!(matches!(err, WatermarkError::Badge { .. }));
    }

    #[test]
    fn garbage_input_is_an_error() {
        let err = apply_watermark(b"definitely not an image", None, 0.7).unwrap_err();
        assert!(matches!(err, WatermarkError::Image(_)));
    }
}
