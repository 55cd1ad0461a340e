//! Geometric shapes drawn with a brush

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::DrawLayer;
use crate::blend::composite_pixel;
use crate::brush::Brush;
use crate::error::PaintResult;
use crate::mask::generate_stamp_mask;
use crate::stroke::{rasterize_path, StrokeSample};
use crate::types::{BlendMode, Color, DirtyRect, PaintMode};

/// Most outline points generated for one ellipse
const MAX_ELLIPSE_SEGMENTS: usize = 4096;

/// A shape in canvas pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Line { from: Vec2, to: Vec2 },
    /// Axis-aligned rectangle between two opposite corners
    Rect { min: Vec2, max: Vec2 },
    Ellipse { center: Vec2, radii: Vec2 },
}

impl Shape {
    /// Outline as a polyline; closed shapes repeat their first point.
    pub fn outline(&self) -> Vec<Vec2> {
        match *self {
            Shape::Line { from, to } => vec![from, to],
            Shape::Rect { min, max } => {
                let (lo, hi) = (min.min(max), min.max(max));
                vec![lo, Vec2::new(hi.x, lo.y), hi, Vec2::new(lo.x, hi.y), lo]
            }
            Shape::Ellipse { center, radii } => {
                let radii = radii.abs();
                // Ramanujan's perimeter approximation, one point per ~2 px
                let (a, b) = (radii.x, radii.y);
                let h = ((3.0 * a + b) * (a + 3.0 * b)).sqrt();
                let perimeter = std::f32::consts::PI * (3.0 * (a + b) - h);
                let segments = ((perimeter / 2.0).ceil() as usize).clamp(16, MAX_ELLIPSE_SEGMENTS);
                (0..=segments)
                    .map(|i| {
                        let angle = TAU * (i % segments) as f32 / segments as f32;
                        center + Vec2::new(angle.cos(), angle.sin()) * radii
                    })
                    .collect()
            }
        }
    }

    /// Whether the pixel centered at `p` lies inside the filled shape
    fn contains(&self, p: Vec2) -> bool {
        match *self {
            Shape::Line { .. } => false,
            Shape::Rect { min, max } => {
                let (lo, hi) = (min.min(max), min.max(max));
                p.cmpge(lo).all() && p.cmple(hi).all()
            }
            Shape::Ellipse { center, radii } => {
                let radii = radii.abs();
                if radii.x <= 0.0 || radii.y <= 0.0 {
                    return false;
                }
                ((p - center) / radii).length_squared() <= 1.0
            }
        }
    }

    /// Bounding box as (min, max)
    fn bounds(&self) -> (Vec2, Vec2) {
        match *self {
            Shape::Line { from, to } => (from.min(to), from.max(to)),
            Shape::Rect { min, max } => (min.min(max), min.max(max)),
            Shape::Ellipse { center, radii } => (center - radii.abs(), center + radii.abs()),
        }
    }
}

impl DrawLayer {
    /// Draw `shape` with `brush` at full pressure.
    ///
    /// The outline is stroked with the brush's usual spacing. With `filled`
    /// the interior is first painted flat at the brush's opacity and flow.
    /// Lines ignore `filled`.
    pub fn draw_shape(
        &mut self,
        shape: Shape,
        brush: &Brush,
        color: Color,
        filled: bool,
    ) -> PaintResult<Option<DirtyRect>> {
        self.ensure_unlocked()?;

        let mut dirty = None;
        if filled {
            dirty = self.fill_interior(&shape, color, brush.stamp_alpha(1.0));
        }

        let mask = generate_stamp_mask(brush, brush.effective_size(1.0));
        let alpha = brush.stamp_alpha(1.0);
        let samples = shape.outline().into_iter().map(|p| StrokeSample::new(p, 1.0));
        let stamps = rasterize_path(samples, brush.effective_spacing());
        for stamp in &stamps {
            let rect = self.apply_mask(stamp.position, &mask, color, alpha, PaintMode::Paint)?;
            dirty = DirtyRect::merge(dirty, rect);
        }

        debug!(
            "DrawLayer::draw_shape: layer {} {:?} filled={} stamps={}",
            self.id,
            shape,
            filled,
            stamps.len()
        );
        Ok(dirty)
    }

    pub fn draw_line(
        &mut self,
        from: Vec2,
        to: Vec2,
        brush: &Brush,
        color: Color,
    ) -> PaintResult<Option<DirtyRect>> {
        self.draw_shape(Shape::Line { from, to }, brush, color, false)
    }

    pub fn draw_rect(
        &mut self,
        min: Vec2,
        max: Vec2,
        brush: &Brush,
        color: Color,
        filled: bool,
    ) -> PaintResult<Option<DirtyRect>> {
        self.draw_shape(Shape::Rect { min, max }, brush, color, filled)
    }

    pub fn draw_ellipse(
        &mut self,
        center: Vec2,
        radii: Vec2,
        brush: &Brush,
        color: Color,
        filled: bool,
    ) -> PaintResult<Option<DirtyRect>> {
        self.draw_shape(Shape::Ellipse { center, radii }, brush, color, filled)
    }

    fn fill_interior(&mut self, shape: &Shape, color: Color, alpha: f32) -> Option<DirtyRect> {
        if alpha <= 0.0 {
            return None;
        }
        let (lo, hi) = shape.bounds();
        let x_min = (lo.x.floor() as i32).max(0);
        let y_min = (lo.y.floor() as i32).max(0);
        let x_max = (hi.x.ceil() as i32).min(self.buffer.width() as i32 - 1);
        let y_max = (hi.y.ceil() as i32).min(self.buffer.height() as i32 - 1);

        let mut dirty = None;
        for y in y_min..=y_max {
            for x in x_min..=x_max {
                if !shape.contains(Vec2::new(x as f32, y as f32)) {
                    continue;
                }
                self.buffer
                    .update(x, y, |dst| composite_pixel(dst, color, BlendMode::Normal, alpha));
                let pixel = DirtyRect {
                    x: x as u32,
                    y: y as u32,
                    width: 1,
                    height: 1,
                };
                dirty = DirtyRect::merge(dirty, Some(pixel));
            }
        }
        dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PaintError;
    use crate::types::LayerId;

    fn pixel_pen() -> Brush {
        Brush::PENCIL.with_size(1).with_spacing(0.5)
    }

    fn painted(layer: &DrawLayer) -> Vec<(i32, i32)> {
        let mut out = Vec::new();
        for y in 0..layer.height() as i32 {
            for x in 0..layer.width() as i32 {
                if layer.buffer().get(x, y) != Color::TRANSPARENT {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn test_horizontal_line() {
        let mut layer = DrawLayer::new(LayerId(0), "L", 10, 10).unwrap();
        let dirty = layer
            .draw_line(Vec2::new(1.0, 5.0), Vec2::new(8.0, 5.0), &pixel_pen(), Color::BLACK)
            .unwrap();

        let expected: Vec<_> = (1..=8).map(|x| (x, 5)).collect();
        assert_eq!(painted(&layer), expected);
        assert_eq!(dirty, Some(DirtyRect { x: 1, y: 5, width: 8, height: 1 }));
    }

    #[test]
    fn test_rect_outline_and_fill() {
        let mut outline = DrawLayer::new(LayerId(0), "L", 10, 10).unwrap();
        outline
            .draw_rect(Vec2::new(2.0, 2.0), Vec2::new(6.0, 6.0), &pixel_pen(), Color::RED, false)
            .unwrap();
        assert_eq!(outline.buffer().get(2, 2), Color::RED);
        assert_eq!(outline.buffer().get(6, 4), Color::RED);
        assert_eq!(outline.buffer().get(4, 4), Color::TRANSPARENT);
        assert_eq!(painted(&outline).len(), 16);

        let mut filled = DrawLayer::new(LayerId(0), "L", 10, 10).unwrap();
        // Corners given in reverse order
        filled
            .draw_rect(Vec2::new(6.0, 6.0), Vec2::new(2.0, 2.0), &pixel_pen(), Color::RED, true)
            .unwrap();
        assert_eq!(painted(&filled).len(), 25);
        assert_eq!(filled.buffer().get(4, 4), Color::RED);
        assert_eq!(filled.buffer().get(7, 4), Color::TRANSPARENT);
    }

    #[test]
    fn test_filled_ellipse_symmetric() {
        let mut layer = DrawLayer::new(LayerId(0), "L", 21, 21).unwrap();
        let radii = Vec2::new(6.0, 3.0);
        let dirty = layer
            .draw_ellipse(Vec2::new(10.0, 10.0), radii, &pixel_pen(), Color::BLUE, true)
            .unwrap();

        assert_eq!(layer.buffer().get(10, 10), Color::BLUE);
        assert_eq!(layer.buffer().get(16, 10), Color::BLUE);
        assert_eq!(layer.buffer().get(4, 10), Color::BLUE);
        assert_eq!(layer.buffer().get(10, 15), Color::TRANSPARENT);
        assert_eq!(dirty, Some(DirtyRect { x: 4, y: 7, width: 13, height: 7 }));
    }

    #[test]
    fn test_ellipse_outline_is_closed() {
        let outline = Shape::Ellipse {
            center: Vec2::ZERO,
            radii: Vec2::new(20.0, 10.0),
        }
        .outline();
        assert!(outline.len() >= 17);
        assert!(outline[0].distance(outline[outline.len() - 1]) < 1e-3);
    }

    #[test]
    fn test_shape_on_locked_layer() {
        let mut layer = DrawLayer::new(LayerId(4), "L", 8, 8).unwrap();
        layer.set_locked(true);
        let result = layer.draw_rect(Vec2::ZERO, Vec2::splat(4.0), &pixel_pen(), Color::RED, true);
        assert!(matches!(result, Err(PaintError::LayerLocked(LayerId(4)))));
        assert!(painted(&layer).is_empty());
    }

    #[test]
    fn test_shape_serde_tagged() {
        let shape = Shape::Line {
            from: Vec2::ZERO,
            to: Vec2::new(3.0, 4.0),
        };
        let json = serde_json::to_string(&shape).unwrap();
        assert!(json.contains("\"type\":\"line\""));
        assert_eq!(serde_json::from_str::<Shape>(&json).unwrap(), shape);
    }
}
