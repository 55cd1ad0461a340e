//! Merging layers: merge down, merge visible, flatten

use tracing::info;

use super::{LayerEvent, LayerManager};
use crate::error::{PaintError, PaintResult};
use crate::layer::DrawLayer;
use crate::surface::PixelBuffer;
use crate::types::{BlendMode, LayerId};

impl LayerManager {
    /// Combine `id` with the layer directly below it and remove `id`.
    ///
    /// The lower layer keeps its id and receives the two-layer composite
    /// exactly as the stack rendered it, so it ends up visible, at opacity
    /// 1.0 in Normal mode. Fails with [`PaintError::NoMergeTarget`] on the
    /// bottom layer and [`PaintError::LayerLocked`] when the lower layer is
    /// locked.
    pub fn merge_down(&mut self, id: LayerId) -> PaintResult<LayerId> {
        let index = self.index_of(id)?;
        if index == 0 {
            return Err(PaintError::NoMergeTarget(id));
        }
        let target = &self.layers[index - 1];
        target.ensure_unlocked()?;
        let target_id = target.id();

        let merged = self.blend_stack(&self.layers[index - 1..=index]);
        self.layers.remove(index);
        flatten_properties(&mut self.layers[index - 1], merged);
        self.composite_stale = true;
        info!("LayerManager: merged layer {} down into {}", id, target_id);

        let handoff = self.active == Some(id);
        if handoff {
            self.active = Some(target_id);
        }
        self.emit(LayerEvent::Merged {
            into: target_id,
            removed: vec![id],
        });
        if handoff {
            self.emit(LayerEvent::ActiveChanged {
                previous: Some(id),
                current: Some(target_id),
            });
        }
        Ok(target_id)
    }

    /// Combine every visible layer into the lowest visible one.
    ///
    /// Hidden layers stay where they are. The result is opaque to further
    /// blending: opacity 1.0, Normal mode.
    pub fn merge_visible(&mut self) -> PaintResult<LayerId> {
        let Some(base) = self.layers.iter().position(DrawLayer::is_visible) else {
            return Err(PaintError::NothingToMerge);
        };
        self.collapse_into(base, |layer| layer.is_visible())
    }

    /// Combine the whole stack into the bottom layer.
    ///
    /// Hidden layers contribute nothing and are discarded. The result is
    /// visible, at opacity 1.0 in Normal mode.
    pub fn flatten(&mut self) -> PaintResult<LayerId> {
        if self.layers.is_empty() {
            return Err(PaintError::NothingToMerge);
        }
        self.collapse_into(0, |_| true)
    }

    /// Replace the layer at `base` by the composite of the layers selected by
    /// `include` and drop the other selected layers
    fn collapse_into(
        &mut self,
        base: usize,
        include: impl Fn(&DrawLayer) -> bool,
    ) -> PaintResult<LayerId> {
        let base_layer = &self.layers[base];
        base_layer.ensure_unlocked()?;
        let into = base_layer.id();

        let merged = self.blend_stack(self.layers.iter().filter(|layer| include(layer)));
        let removed: Vec<LayerId> = self
            .layers
            .iter()
            .filter(|layer| layer.id() != into && include(layer))
            .map(DrawLayer::id)
            .collect();

        self.layers
            .retain(|layer| layer.id() == into || !include(layer));
        let index = self.index_of(into)?;
        flatten_properties(&mut self.layers[index], merged);
        self.composite_stale = true;

        info!(
            "LayerManager: merged {} layers into {}",
            removed.len() + 1,
            into
        );
        let handoff = self.active.filter(|active| removed.contains(active));
        if handoff.is_some() {
            self.active = Some(into);
        }
        self.emit(LayerEvent::Merged { into, removed });
        if let Some(previous) = handoff {
            self.emit(LayerEvent::ActiveChanged {
                previous: Some(previous),
                current: Some(into),
            });
        }
        Ok(into)
    }
}

/// Install a merge result; it already carries the blending of its sources
fn flatten_properties(layer: &mut DrawLayer, merged: PixelBuffer) {
    layer.replace_buffer(merged);
    layer.set_visible(true);
    layer.set_opacity(1.0);
    layer.set_blend_mode(BlendMode::Normal);
}
