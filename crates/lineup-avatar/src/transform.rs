use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use lineup_core::constants::DEFAULT_AVATAR_TARGET_DIM;
use thiserror::Error;

/// Every stored avatar is encoded in this format regardless of input.
pub const CANONICAL_EXTENSION: &str = "png";
pub const CANONICAL_CONTENT_TYPE: &str = "image/png";

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Unsupported or corrupt image data: {0}")]
    UnsupportedImage(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Normalizes uploaded images to a fixed square PNG.
///
/// The image is center-cropped to its shorter side and then resized to
/// `target_dim` pixels, so non-square inputs lose their margins rather than
/// getting distorted.
#[derive(Clone, Copy)]
pub struct Normalizer {
    target_dim: u32,
}

impl Normalizer {
    pub fn new(target_dim: u32) -> Self {
        Self { target_dim }
    }

    pub fn target_dim(&self) -> u32 {
        self.target_dim
    }

    /// Decode, square-crop, resize, and re-encode.
    ///
    /// CPU-bound; call from `spawn_blocking` on async paths.
    pub fn normalize(&self, data: &[u8]) -> Result<Vec<u8>, TransformError> {
        let image = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| TransformError::UnsupportedImage(e.to_string()))?
            .decode()
            .map_err(|e| TransformError::UnsupportedImage(e.to_string()))?;

        let squared = center_crop_square(&image);
        let filter = select_filter(squared.width(), self.target_dim);
        let resized = squared.resize_exact(self.target_dim, self.target_dim, filter);

        let mut out = Cursor::new(Vec::new());
        resized
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| TransformError::Encode(e.to_string()))?;

        Ok(out.into_inner())
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_AVATAR_TARGET_DIM)
    }
}

fn center_crop_square(image: &DynamicImage) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    let side = width.min(height);
    if width == height {
        return image.clone();
    }
    let x = (width - side) / 2;
    let y = (height - side) / 2;
    image.crop_imm(x, y, side, side)
}

/// Pick a resize filter by scale ratio: cheap filters for heavy downscales
/// where ringing is invisible anyway, Lanczos3 for everything near 1:1.
fn select_filter(source_dim: u32, target_dim: u32) -> FilterType {
    let ratio = source_dim as f64 / target_dim as f64;
    if ratio > 2.0 {
        FilterType::Triangle
    } else if ratio > 1.5 {
        FilterType::CatmullRom
    } else {
        FilterType::Lanczos3
    }
}
