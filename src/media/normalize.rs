//! Canonicalization of decoded client images and masks
//!
//! Images become 8-bit RGB, masks become 8-bit single channel. Alpha is
//! dropped by keeping the colour channels as they are, never blended.

use image::{imageops::FilterType, DynamicImage, GrayImage, Rgb, RgbImage};
use tracing::debug;

use crate::error::{AppError, Result};

/// Longest side accepted by default
pub const DEFAULT_MAX_SIDE: u32 = 4096;

/// 8-bit RGB input image
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub pixels: RgbImage,
    /// Whether the source carried an alpha channel that was discarded
    pub alpha_dropped: bool,
}

impl NormalizedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

/// 8-bit single channel mask
#[derive(Debug, Clone)]
pub struct NormalizedMask {
    pub pixels: GrayImage,
}

impl NormalizedMask {
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

/// Image/mask normalizer with dimension bounds
#[derive(Debug, Clone)]
pub struct Normalizer {
    max_side: u32,
    working_max_side: Option<u32>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIDE)
    }
}

impl Normalizer {
    pub fn new(max_side: u32) -> Self {
        Self {
            max_side,
            working_max_side: None,
        }
    }

    /// Downscale inputs so the longer side fits `side` before inference
    pub fn with_working_max_side(mut self, side: Option<u32>) -> Self {
        self.working_max_side = side;
        self
    }

    /// Decode `bytes` into an RGB image and enforce the size bound.
    pub fn normalize_image(&self, bytes: &[u8]) -> Result<NormalizedImage> {
        let decoded = image::load_from_memory(bytes)?;
        let color = decoded.color();

        let normalized = if color.has_alpha() {
            NormalizedImage {
                pixels: drop_alpha(&decoded),
                alpha_dropped: true,
            }
        } else {
            NormalizedImage {
                pixels: decoded.to_rgb8(),
                alpha_dropped: false,
            }
        };

        debug!(
            source_color = ?color,
            width = normalized.width(),
            height = normalized.height(),
            alpha_dropped = normalized.alpha_dropped,
            "Normalized image"
        );

        // Checked on the normalized buffer so the bound applies to what the backend would see
        let (width, height) = normalized.dimensions();
        if width.max(height) > self.max_side {
            return Err(AppError::SizeLimitExceeded {
                width,
                height,
                limit: self.max_side,
            });
        }

        Ok(normalized)
    }

    /// Decode `bytes` into a single 8-bit channel. Values are not thresholded.
    pub fn normalize_mask(&self, bytes: &[u8]) -> Result<NormalizedMask> {
        let decoded = image::load_from_memory(bytes)?;
        debug!(source_color = ?decoded.color(), "Normalized mask");
        Ok(NormalizedMask {
            pixels: decoded.to_luma8(),
        })
    }

    /// Bring image and mask to the same working dimensions.
    ///
    /// The image is downscaled (Lanczos3) when a working side is configured;
    /// the mask follows the image with nearest-neighbour sampling so its
    /// values are carried over rather than interpolated.
    pub fn align(&self, image: NormalizedImage, mask: NormalizedMask) -> (NormalizedImage, NormalizedMask) {
        let (width, height) = image.dimensions();
        let (target_w, target_h) = match self.working_max_side {
            Some(side) => fit_within(width, height, side),
            None => (width, height),
        };

        let image = if (target_w, target_h) != (width, height) {
            debug!(from = ?(width, height), to = ?(target_w, target_h), "Downscaling image to working size");
            NormalizedImage {
                pixels: image::imageops::resize(&image.pixels, target_w, target_h, FilterType::Lanczos3),
                alpha_dropped: image.alpha_dropped,
            }
        } else {
            image
        };

        let mask = if mask.dimensions() != (target_w, target_h) {
            debug!(from = ?mask.dimensions(), to = ?(target_w, target_h), "Resizing mask to image size");
            NormalizedMask {
                pixels: image::imageops::resize(&mask.pixels, target_w, target_h, FilterType::Nearest),
            }
        } else {
            mask
        };

        (image, mask)
    }
}

/// Recombine only the colour channels of an image that has alpha
fn drop_alpha(decoded: &DynamicImage) -> RgbImage {
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, _] = rgba.get_pixel(x, y).0;
        Rgb([r, g, b])
    })
}

/// Proportional size whose longer side is at most `max_side`
fn fit_within(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_side {
        return (width, height);
    }
    let scale = max_side as f64 / longest as f64;
    let w = ((width as f64 * scale) as u32).max(1);
    let h = ((height as f64 * scale) as u32).max(1);
    (w, h)
}
