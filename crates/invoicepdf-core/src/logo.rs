//! Company logo loading
//!
//! The logo is decoded once per batch and shared by every invoice.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::debug;

use crate::error::InvoiceError;

/// Decoded logo pixels, ready to embed as an image XObject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoImage {
    pub path: PathBuf,
    pub width_px: u32,
    pub height_px: u32,
    /// 8-bit RGB samples, row-major
    pub rgb: Vec<u8>,
    /// 8-bit alpha samples when the source has transparency
    pub alpha: Option<Vec<u8>>,
}

impl LogoImage {
    /// Decode a PNG or JPEG logo
    pub fn load(path: &Path) -> Result<Self, InvoiceError> {
        let image = image::open(path).map_err(|e| InvoiceError::ImageLoadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let logo = Self::from_image(path, &image)?;
        debug!(
            "Loaded logo {} ({}x{}px, alpha: {})",
            path.display(),
            logo.width_px,
            logo.height_px,
            logo.alpha.is_some()
        );
        Ok(logo)
    }

    /// Convert an already decoded image
    pub fn from_image(path: &Path, image: &DynamicImage) -> Result<Self, InvoiceError> {
        let (width_px, height_px) = (image.width(), image.height());
        if width_px == 0 || height_px == 0 {
            return Err(InvoiceError::ImageLoadError {
                path: path.to_path_buf(),
                reason: "image has no pixels".into(),
            });
        }

        let (rgb, alpha) = if image.color().has_alpha() {
            let rgba = image.to_rgba8();
            let mut rgb = Vec::with_capacity(sample_count(width_px, height_px, 3));
            let mut alpha = Vec::with_capacity(sample_count(width_px, height_px, 1));
            for pixel in rgba.pixels() {
                rgb.extend_from_slice(&pixel.0[..3]);
                alpha.push(pixel.0[3]);
            }
            (rgb, Some(alpha))
        } else {
            (image.to_rgb8().into_raw(), None)
        };

        Ok(Self {
            path: path.to_path_buf(),
            width_px,
            height_px,
            rgb,
            alpha,
        })
    }

    /// Height that keeps the aspect ratio at the given width
    pub fn height_for_width(&self, width: f32) -> f32 {
        width * self.height_px as f32 / self.width_px as f32
    }
}

/// Number of 8-bit samples in a `width` x `height` image
fn sample_count(width: u32, height: u32, channels: usize) -> usize {
    width as usize * height as usize * channels
}
