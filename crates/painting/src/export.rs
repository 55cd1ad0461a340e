//! Raster import and export
//!
//! Lossless export is PNG with straight alpha preserved per pixel, so a
//! decode of the output reproduces the buffer exactly (alpha = 0 pixels
//! included). Lossy export is JPEG with alpha flattened over a background.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::blend::composite_pixel;
use crate::error::{PaintError, PaintResult};
use crate::surface::PixelBuffer;
use crate::types::{BlendMode, Color};

/// Output encoding for [`crate::engine::DrawingEngine::export`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum ExportFormat {
    Png,
    /// Quality 0..=100; 0 is treated as the encoder minimum of 1
    Jpeg { quality: u8 },
}

fn to_rgba_image(buffer: &PixelBuffer) -> PaintResult<RgbaImage> {
    RgbaImage::from_raw(buffer.width(), buffer.height(), buffer.as_bytes().to_vec()).ok_or(
        PaintError::InvalidDimensions {
            width: buffer.width(),
            height: buffer.height(),
        },
    )
}

/// Encode as PNG (lossless RGBA8)
pub fn encode_png(buffer: &PixelBuffer) -> PaintResult<Vec<u8>> {
    let image = to_rgba_image(buffer)?;
    let mut out = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(PaintError::Encode)?;
    debug!(
        "encode_png: {}x{} -> {} bytes",
        buffer.width(),
        buffer.height(),
        out.len()
    );
    Ok(out)
}

/// Encode as JPEG after flattening over `background` (its alpha is ignored)
pub fn encode_jpeg(buffer: &PixelBuffer, quality: u8, background: Color) -> PaintResult<Vec<u8>> {
    if quality > 100 {
        return Err(PaintError::InvalidQuality(quality));
    }
    let backdrop = Color { a: 255, ..background };

    let mut rgb = Vec::with_capacity(buffer.pixel_count() * 3);
    for &pixel in buffer.pixels() {
        let flat = composite_pixel(backdrop, pixel, BlendMode::Normal, 1.0);
        rgb.extend_from_slice(&[flat.r, flat.g, flat.b]);
    }
    let image = RgbImage::from_raw(buffer.width(), buffer.height(), rgb).ok_or(
        PaintError::InvalidDimensions {
            width: buffer.width(),
            height: buffer.height(),
        },
    )?;

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality.max(1));
    DynamicImage::ImageRgb8(image)
        .write_with_encoder(encoder)
        .map_err(PaintError::Encode)?;
    debug!(
        "encode_jpeg: {}x{} quality={} -> {} bytes",
        buffer.width(),
        buffer.height(),
        quality,
        out.len()
    );
    Ok(out)
}

/// Encode in the requested format
pub fn encode(
    buffer: &PixelBuffer,
    format: ExportFormat,
    background: Color,
) -> PaintResult<Vec<u8>> {
    match format {
        ExportFormat::Png => encode_png(buffer),
        ExportFormat::Jpeg { quality } => encode_jpeg(buffer, quality, background),
    }
}

/// Decode any supported raster (PNG or JPEG) into an RGBA buffer
pub fn decode_image(bytes: &[u8]) -> PaintResult<PixelBuffer> {
    let rgba = image::load_from_memory(bytes)
        .map_err(PaintError::Decode)?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    PixelBuffer::from_rgba8(width, height, rgba.as_raw())
}
