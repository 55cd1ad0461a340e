//! Stamp application for brush strokes

use glam::Vec2;
use tracing::debug;

use super::DrawLayer;
use crate::blend::{composite_pixel, erase_pixel};
use crate::brush::Brush;
use crate::error::PaintResult;
use crate::mask::{generate_stamp_mask, StampMask};
use crate::types::{BlendMode, Color, DirtyRect, PaintMode};

impl DrawLayer {
    /// Apply one brush stamp at `position`.
    ///
    /// Size and opacity follow the brush's pressure dynamics. Returns the
    /// affected region, or None if the stamp fell entirely outside the layer.
    pub fn apply_stamp(
        &mut self,
        position: Vec2,
        brush: &Brush,
        color: Color,
        pressure: f32,
    ) -> PaintResult<Option<DirtyRect>> {
        self.ensure_unlocked()?;
        let mask = generate_stamp_mask(brush, brush.effective_size(pressure));
        self.apply_mask(position, &mask, color, brush.stamp_alpha(pressure), PaintMode::Paint)
    }

    /// Blend a precomputed mask into the layer.
    ///
    /// Each cell with coverage `c` composites `color` with alpha `c * alpha`
    /// ("over", straight alpha), or removes that much coverage in erase mode.
    /// Cells outside the buffer are skipped.
    pub fn apply_mask(
        &mut self,
        position: Vec2,
        mask: &StampMask,
        color: Color,
        alpha: f32,
        mode: PaintMode,
    ) -> PaintResult<Option<DirtyRect>> {
        self.ensure_unlocked()?;

        if alpha.is_nan() || alpha <= 0.0 {
            debug!("  -> skipped: zero stamp alpha");
            return Ok(None);
        }
        if !position.is_finite() {
            debug!("  -> skipped: non-finite position");
            return Ok(None);
        }

        // Pixel centers sit on integer coordinates. Bounds are computed in
        // saturating i64 so far off-canvas positions cannot overflow.
        let center_x = position.x.round() as i64;
        let center_y = position.y.round() as i64;
        let start = i64::from(mask.offset());
        let end = start + i64::from(mask.size());

        // Patch bounds clamped to the buffer
        let x_min = center_x.saturating_add(start).max(0);
        let y_min = center_y.saturating_add(start).max(0);
        let x_max = center_x.saturating_add(end).min(i64::from(self.buffer.width()));
        let y_max = center_y.saturating_add(end).min(i64::from(self.buffer.height()));

        // Check if completely outside
        if x_min >= x_max || y_min >= y_max {
            return Ok(None);
        }

        // Inside the buffer, so everything fits in i32 from here on
        let (center_x, center_y) = (center_x as i32, center_y as i32);
        let (x_min, y_min, x_max, y_max) = (x_min as i32, y_min as i32, x_max as i32, y_max as i32);

        for py in y_min..y_max {
            for px in x_min..x_max {
                let coverage = mask.coverage_at(px - center_x, py - center_y);
                if coverage <= 0.0 {
                    continue;
                }
                let stamp_alpha = coverage * alpha;
                match mode {
                    PaintMode::Paint => self.buffer.update(px, py, |dst| {
                        composite_pixel(dst, color, BlendMode::Normal, stamp_alpha)
                    }),
                    PaintMode::Erase => {
                        self.buffer.update(px, py, |dst| erase_pixel(dst, stamp_alpha))
                    }
                }
            }
        }

        Ok(Some(DirtyRect {
            x: x_min as u32,
            y: y_min as u32,
            width: (x_max - x_min) as u32,
            height: (y_max - y_min) as u32,
        }))
    }
}
