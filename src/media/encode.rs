//! Encoding of image buffers into JPEG and PNG bytes

use image::{codecs::jpeg::JpegEncoder, DynamicImage, GrayImage, ImageOutputFormat, RgbImage};
use std::io::Cursor;

use crate::error::{AppError, Result};

pub const JPEG_MIME: &str = "image/jpeg";
pub const PNG_MIME: &str = "image/png";

/// Encode an RGB buffer as baseline JPEG at `quality` (1..=100)
pub fn jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(image)
        .map_err(|e| AppError::Internal(format!("JPEG encoding failed: {}", e)))?;
    Ok(buf)
}

pub fn png_rgb(image: &RgbImage) -> Result<Vec<u8>> {
    png(DynamicImage::ImageRgb8(image.clone()))
}

pub fn png_gray(image: &GrayImage) -> Result<Vec<u8>> {
    png(DynamicImage::ImageLuma8(image.clone()))
}

fn png(image: DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
        .map_err(|e| AppError::Internal(format!("PNG encoding failed: {}", e)))?;
    Ok(buf)
}
