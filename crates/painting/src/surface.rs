//! CPU pixel buffer for painting - 8-bit straight-alpha RGBA storage

use glam::IVec2;

use crate::error::{PaintError, PaintResult};
use crate::types::Color;

/// A dense row-major RGBA8 pixel buffer.
///
/// Dimensions are fixed at creation. Every coordinate access is bounds
/// checked: out-of-range reads return transparent black and out-of-range
/// writes are ignored, since brush strokes routinely run past the edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl PixelBuffer {
    /// Create a new buffer initialized to transparent black
    pub fn new(width: u32, height: u32) -> PaintResult<Self> {
        Self::filled(width, height, Color::TRANSPARENT)
    }

    /// Create a new buffer filled with `color`
    pub fn filled(width: u32, height: u32, color: Color) -> PaintResult<Self> {
        if width == 0 || height == 0 {
            return Err(PaintError::InvalidDimensions { width, height });
        }
        let pixel_count = (width as usize) * (height as usize);
        Ok(Self {
            width,
            height,
            pixels: vec![color; pixel_count],
        })
    }

    /// Wrap raw RGBA8 bytes (row-major, 4 bytes per pixel)
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> PaintResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if width == 0 || height == 0 || bytes.len() != expected {
            return Err(PaintError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels: bytemuck::cast_slice(bytes).to_vec(),
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some((y as usize) * (self.width as usize) + (x as usize))
    }

    /// Whether (x, y) lies inside the buffer
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    /// Get a pixel, or transparent black if out of bounds
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Color {
        self.index(x, y)
            .map(|i| self.pixels[i])
            .unwrap_or(Color::TRANSPARENT)
    }

    /// Set a pixel. Does nothing if out of bounds
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, color: Color) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Replace a pixel with `f(old)`. Does nothing if out of bounds
    #[inline]
    pub fn update(&mut self, x: i32, y: i32, f: impl FnOnce(Color) -> Color) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = f(self.pixels[i]);
        }
    }

    /// Fill every pixel with a solid color
    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Copy `src` into this buffer with its top-left corner at `dest_offset`.
    ///
    /// Only the overlapping region is copied; neither buffer is resized.
    /// Returns the number of pixels written.
    pub fn blit(&mut self, src: &PixelBuffer, dest_offset: IVec2) -> usize {
        // Overlap in destination coordinates
        let x0 = dest_offset.x.max(0);
        let y0 = dest_offset.y.max(0);
        let x1 = (dest_offset.x + src.width as i32).min(self.width as i32);
        let y1 = (dest_offset.y + src.height as i32).min(self.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return 0;
        }

        let row_len = (x1 - x0) as usize;
        for y in y0..y1 {
            let src_x = (x0 - dest_offset.x) as usize;
            let src_y = (y - dest_offset.y) as usize;
            let src_start = src_y * src.width as usize + src_x;
            let dst_start = (y as usize) * (self.width as usize) + x0 as usize;
            self.pixels[dst_start..dst_start + row_len]
                .copy_from_slice(&src.pixels[src_start..src_start + row_len]);
        }
        row_len * (y1 - y0) as usize
    }

    /// Downscale into a buffer no larger than `max_side` on either axis,
    /// averaging each source block (aspect ratio kept)
    pub fn thumbnail(&self, max_side: u32) -> PaintResult<PixelBuffer> {
        let max_side = max_side.max(1);
        let scale = (self.width.max(self.height) as f32 / max_side as f32).max(1.0);
        let tw = ((self.width as f32 / scale).round() as u32).clamp(1, max_side);
        let th = ((self.height as f32 / scale).round() as u32).clamp(1, max_side);
        let mut out = PixelBuffer::new(tw, th)?;

        for ty in 0..th {
            let sy0 = (ty as u64 * self.height as u64 / th as u64) as u32;
            let sy1 = (((ty + 1) as u64 * self.height as u64 / th as u64) as u32).max(sy0 + 1);
            for tx in 0..tw {
                let sx0 = (tx as u64 * self.width as u64 / tw as u64) as u32;
                let sx1 = (((tx + 1) as u64 * self.width as u64 / tw as u64) as u32).max(sx0 + 1);

                let mut sum = [0u64; 4];
                let mut count = 0u64;
                for sy in sy0..sy1.min(self.height) {
                    for sx in sx0..sx1.min(self.width) {
                        let c = self.get(sx as i32, sy as i32);
                        sum[0] += c.r as u64;
                        sum[1] += c.g as u64;
                        sum[2] += c.b as u64;
                        sum[3] += c.a as u64;
                        count += 1;
                    }
                }
                let count = count.max(1);
                out.set(
                    tx as i32,
                    ty as i32,
                    Color::rgba(
                        (sum[0] / count) as u8,
                        (sum[1] / count) as u8,
                        (sum[2] / count) as u8,
                        (sum[3] / count) as u8,
                    ),
                );
            }
        }
        Ok(out)
    }

    /// Raw RGBA8 bytes for upload or export
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Get the total number of pixels
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    /// Get direct access to pixel data (for advanced operations)
    #[inline]
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Get mutable access to pixel data (for advanced operations)
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [Color] {
        &mut self.pixels
    }
}
