//! State of one in-progress stroke

use glam::Vec2;
use serde::Serialize;

use crate::brush::Brush;
use crate::error::PaintResult;
use crate::manager::LayerManager;
use crate::mask::MaskCache;
use crate::stroke::{StrokeRasterizer, StrokeSample};
use crate::types::{Color, DirtyRect, LayerId, PaintMode};

/// What one gesture call did to the canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StrokeReport {
    /// Stamps applied by this call
    pub stamps: usize,
    /// Region touched by this call
    pub dirty: Option<DirtyRect>,
}

/// Brush, color and target captured at `begin_draw`
#[derive(Debug)]
pub(crate) struct StrokeSession {
    pub(crate) layer: LayerId,
    brush: Brush,
    color: Color,
    mode: PaintMode,
    rasterizer: StrokeRasterizer,
    masks: MaskCache,
    /// Union of everything touched so far
    pub(crate) dirty: Option<DirtyRect>,
}

impl StrokeSession {
    pub(crate) fn new(layer: LayerId, brush: Brush, color: Color, mode: PaintMode) -> Self {
        Self {
            layer,
            rasterizer: StrokeRasterizer::for_brush(&brush),
            brush,
            color,
            mode,
            masks: MaskCache::new(),
            dirty: None,
        }
    }

    #[inline]
    pub(crate) fn stamp_count(&self) -> usize {
        self.rasterizer.stamp_count()
    }

    /// Feed one pointer sample and apply every stamp it makes due
    pub(crate) fn feed(
        &mut self,
        layers: &mut LayerManager,
        position: Vec2,
        pressure: f32,
    ) -> PaintResult<StrokeReport> {
        let layer = layers.layer_mut(self.layer)?;
        layer.ensure_unlocked()?;

        let mut report = StrokeReport::default();
        for stamp in self.rasterizer.push(StrokeSample::new(position, pressure)) {
            let mask = self.masks.get(&self.brush, self.brush.effective_size(stamp.pressure));
            let alpha = self.brush.stamp_alpha(stamp.pressure);
            let rect = layer.apply_mask(stamp.position, &mask, self.color, alpha, self.mode)?;
            report.stamps += 1;
            report.dirty = DirtyRect::merge(report.dirty, rect);
        }
        self.dirty = DirtyRect::merge(self.dirty, report.dirty);
        Ok(report)
    }
}
