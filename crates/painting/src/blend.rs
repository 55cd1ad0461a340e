//! Straight-alpha compositing math shared by stamps, merges and the layer composite.
//!
//! All math runs on normalized `f32` channels. [`blend_channel`] is the
//! per-mode result over an opaque backdrop; [`composite_pixel`] extends it to
//! partially transparent backdrops by weighting with the backdrop alpha, so a
//! source over a fully transparent pixel keeps its own color.

use crate::surface::PixelBuffer;
use crate::types::{BlendMode, Color};

/// Blend one normalized channel over an opaque backdrop.
///
/// `a` is the effective source alpha (layer opacity times source alpha).
#[inline]
pub fn blend_channel(mode: BlendMode, dst: f32, src: f32, a: f32) -> f32 {
    match mode {
        BlendMode::Normal => dst * (1.0 - a) + src * a,
        BlendMode::Multiply => dst * (1.0 - a) + (dst * src) * a,
        BlendMode::Screen => dst * (1.0 - a) + (1.0 - (1.0 - dst) * (1.0 - src)) * a,
        BlendMode::Overlay => dst * (1.0 - a) + overlay(dst, src) * a,
        BlendMode::Add => (dst + src * a).min(1.0),
        BlendMode::Subtract => (dst - src * a).max(0.0),
    }
}

#[inline]
fn overlay(dst: f32, src: f32) -> f32 {
    if dst < 0.5 {
        2.0 * dst * src
    } else {
        1.0 - 2.0 * (1.0 - dst) * (1.0 - src)
    }
}

/// Composite `src` onto `dst` with the given blend mode and opacity.
///
/// Alpha always accumulates with "over": `outA = a + dstA * (1 - a)`.
#[inline]
pub fn composite_pixel(dst: Color, src: Color, mode: BlendMode, opacity: f32) -> Color {
    let s = src.to_f32();
    let a = opacity.clamp(0.0, 1.0) * s[3];
    if a <= 0.0 {
        return dst;
    }

    let d = dst.to_f32();
    let dst_a = d[3];
    let out_a = a + dst_a * (1.0 - a);

    let mut out = [0.0, 0.0, 0.0, out_a];
    for i in 0..3 {
        let over_opaque = blend_channel(mode, d[i], s[i], a);
        out[i] = (dst_a * over_opaque + (1.0 - dst_a) * a * s[i]) / out_a;
    }
    Color::from_f32(out)
}

/// Remove `amount` (0..1) of a pixel's coverage.
///
/// Color is kept (straight alpha); a pixel erased to zero alpha becomes
/// transparent black.
#[inline]
pub fn erase_pixel(dst: Color, amount: f32) -> Color {
    let remaining = (1.0 - amount.clamp(0.0, 1.0)) * (dst.a as f32 / 255.0);
    let alpha = (remaining * 255.0).round() as u8;
    if alpha == 0 {
        Color::TRANSPARENT
    } else {
        Color { a: alpha, ..dst }
    }
}

/// Composite a whole buffer onto another of the same size, in place.
///
/// Buffers of different sizes are composited over their overlapping region.
pub fn composite_onto(dst: &mut PixelBuffer, src: &PixelBuffer, mode: BlendMode, opacity: f32) {
    if opacity <= 0.0 {
        return;
    }
    let width = dst.width().min(src.width()) as usize;
    let height = dst.height().min(src.height()) as usize;
    let dst_stride = dst.width() as usize;
    let src_stride = src.width() as usize;

    let src_pixels = src.pixels();
    let dst_pixels = dst.pixels_mut();
    for y in 0..height {
        let dst_row = &mut dst_pixels[y * dst_stride..y * dst_stride + width];
        let src_row = &src_pixels[y * src_stride..y * src_stride + width];
        for (d, s) in dst_row.iter_mut().zip(src_row) {
            *d = composite_pixel(*d, *s, mode, opacity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Color, b: Color, tolerance: u8) -> bool {
        a.max_channel_diff(b) <= tolerance
    }

    #[test]
    fn test_opaque_normal_is_identity() {
        let backgrounds = [Color::TRANSPARENT, Color::WHITE, Color::rgba(10, 200, 30, 77)];
        let src = Color::rgba(12, 34, 56, 255);
        for bg in backgrounds {
            assert_eq!(composite_pixel(bg, src, BlendMode::Normal, 1.0), src);
        }
    }

    #[test]
    fn test_transparent_source_is_noop() {
        let dst = Color::rgba(1, 2, 3, 4);
        for mode in BlendMode::ALL {
            assert_eq!(composite_pixel(dst, Color::rgba(255, 255, 255, 0), mode, 1.0), dst);
            assert_eq!(composite_pixel(dst, Color::WHITE, mode, 0.0), dst);
        }
    }

    #[test]
    fn test_half_opacity_red_over_blue() {
        let out = composite_pixel(Color::BLUE, Color::RED, BlendMode::Normal, 0.5);
        assert!(close(out, Color::rgba(128, 0, 128, 255), 1), "{out:?}");
    }

    #[test]
    fn test_over_transparent_keeps_source_color() {
        let out = composite_pixel(Color::TRANSPARENT, Color::RED, BlendMode::Normal, 0.5);
        assert_eq!(out, Color::rgba(255, 0, 0, 128));
    }

    #[test]
    fn test_channel_formulas() {
        assert!((blend_channel(BlendMode::Multiply, 0.5, 0.5, 1.0) - 0.25).abs() < 1e-6);
        assert!((blend_channel(BlendMode::Screen, 0.5, 0.5, 1.0) - 0.75).abs() < 1e-6);
        assert!((blend_channel(BlendMode::Overlay, 0.25, 0.5, 1.0) - 0.25).abs() < 1e-6);
        assert!((blend_channel(BlendMode::Overlay, 0.75, 0.5, 1.0) - 0.75).abs() < 1e-6);
        assert_eq!(blend_channel(BlendMode::Add, 0.8, 0.8, 1.0), 1.0);
        assert_eq!(blend_channel(BlendMode::Subtract, 0.2, 0.8, 1.0), 0.0);
    }

    #[test]
    fn test_channel_results_stay_normalized() {
        let steps = [0.0, 0.1, 0.25, 0.5, 0.75, 0.9, 1.0];
        for mode in BlendMode::ALL {
            for &d in &steps {
                for &s in &steps {
                    for &a in &steps {
                        let v = blend_channel(mode, d, s, a);
                        assert!((0.0..=1.0).contains(&v), "{mode:?} {d} {s} {a} -> {v}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_multiply_over_opaque_matches_table() {
        let dst = Color::rgba(200, 100, 50, 255);
        let src = Color::rgba(128, 255, 0, 255);
        let out = composite_pixel(dst, src, BlendMode::Multiply, 1.0);
        assert!(close(out, Color::rgba(100, 100, 0, 255), 1), "{out:?}");
    }

    #[test]
    fn test_erase_pixel() {
        assert_eq!(erase_pixel(Color::RED, 1.0), Color::TRANSPARENT);
        let half = erase_pixel(Color::RED, 0.5);
        assert_eq!((half.r, half.a), (255, 128));
    }

    #[test]
    fn test_composite_onto_buffers() {
        let mut dst = PixelBuffer::filled(2, 2, Color::BLUE).unwrap();
        let mut src = PixelBuffer::new(2, 2).unwrap();
        src.set(1, 1, Color::RED);
        composite_onto(&mut dst, &src, BlendMode::Normal, 1.0);
        assert_eq!(dst.get(0, 0), Color::BLUE);
        assert_eq!(dst.get(1, 1), Color::RED);
    }
}
