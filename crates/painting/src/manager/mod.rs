//! Layer stack management and compositing
//!
//! The [`LayerManager`] owns every [`DrawLayer`] of a canvas in stacking
//! order (index 0 is the bottom), tracks the active layer, and caches the
//! composite of the visible stack. Layers are addressed by [`LayerId`], which
//! stays stable across reorders and is never reused after a delete.

mod events;
mod info;
mod merge;

use glam::IVec2;
use tracing::{debug, info};

use crate::blend::composite_onto;
use crate::error::{PaintError, PaintResult};
use crate::layer::DrawLayer;
use crate::surface::PixelBuffer;
use crate::types::{BlendMode, Color, LayerId};

pub use events::{LayerEvent, LayerListener};
pub use info::{LayerInfo, Thumbnail};

/// Ordered layer stack plus cached composite
pub struct LayerManager {
    width: u32,
    height: u32,
    /// Bottom to top
    pub(crate) layers: Vec<DrawLayer>,
    active: Option<LayerId>,
    next_id: u32,
    /// Last completed composite
    composite: PixelBuffer,
    /// Set whenever a layer may have changed since the last composite
    composite_stale: bool,
    listeners: Vec<LayerListener>,
}

impl std::fmt::Debug for LayerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerManager")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("layers", &self.layers.iter().map(DrawLayer::id).collect::<Vec<_>>())
            .field("active", &self.active)
            .field("composite_stale", &self.composite_stale)
            .field("listener_count", &self.listeners.len())
            .finish()
    }
}

impl LayerManager {
    /// Create an empty stack for a `width` x `height` canvas
    pub fn new(width: u32, height: u32) -> PaintResult<Self> {
        let composite = PixelBuffer::new(width, height)?;
        Ok(Self {
            width,
            height,
            layers: Vec::new(),
            active: None,
            next_id: 0,
            composite,
            composite_stale: false,
            listeners: Vec::new(),
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

    /// Number of layers in the stack
    #[inline]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// All layers, bottom to top
    pub fn layers(&self) -> &[DrawLayer] {
        &self.layers
    }

    /// Register a listener for stack changes
    pub fn add_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&LayerEvent) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub(crate) fn emit(&mut self, event: LayerEvent) {
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    fn allocate_id(&mut self) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Stack position of `id`
    pub fn index_of(&self, id: LayerId) -> PaintResult<usize> {
        self.layers
            .iter()
            .position(|layer| layer.id() == id)
            .ok_or(PaintError::InvalidReference(id))
    }

    pub fn layer(&self, id: LayerId) -> PaintResult<&DrawLayer> {
        let index = self.index_of(id)?;
        Ok(&self.layers[index])
    }

    /// Mutable layer access; marks the composite stale
    pub fn layer_mut(&mut self, id: LayerId) -> PaintResult<&mut DrawLayer> {
        let index = self.index_of(id)?;
        self.composite_stale = true;
        Ok(&mut self.layers[index])
    }

    #[inline]
    pub fn active_id(&self) -> Option<LayerId> {
        self.active
    }

    pub fn active_layer(&self) -> Option<&DrawLayer> {
        self.active.and_then(|id| self.layer(id).ok())
    }

    pub fn active_layer_mut(&mut self) -> PaintResult<&mut DrawLayer> {
        let id = self.active.ok_or(PaintError::NoActiveLayer)?;
        self.layer_mut(id)
    }

    // --- Structure ---

    /// Add a transparent layer on top of the stack.
    ///
    /// The first layer of an empty stack becomes active; later layers do not.
    pub fn create_layer(&mut self, name: impl Into<String>) -> PaintResult<LayerId> {
        let id = self.allocate_id();
        let layer = DrawLayer::new(id, name, self.width, self.height)?;
        self.push_layer(layer);
        Ok(id)
    }

    /// Add a transparent layer on top of the stack and make it active
    pub fn create_layer_active(&mut self, name: impl Into<String>) -> PaintResult<LayerId> {
        let id = self.create_layer(name)?;
        self.set_active_layer(id)?;
        Ok(id)
    }

    /// Add a layer seeded with `image` placed at `offset`.
    ///
    /// The image is clipped to the canvas; uncovered pixels stay transparent.
    pub fn import_layer(
        &mut self,
        name: impl Into<String>,
        image: &PixelBuffer,
        offset: IVec2,
    ) -> PaintResult<LayerId> {
        let mut buffer = PixelBuffer::new(self.width, self.height)?;
        let copied = buffer.blit(image, offset);
        let id = self.allocate_id();
        debug!(
            "LayerManager::import_layer: {} {}x{} at ({}, {}) -> {} pixels",
            id,
            image.width(),
            image.height(),
            offset.x,
            offset.y,
            copied
        );
        self.push_layer(DrawLayer::from_buffer(id, name, buffer));
        Ok(id)
    }

    fn push_layer(&mut self, layer: DrawLayer) {
        let id = layer.id();
        info!("LayerManager: created layer {} '{}'", id, layer.name());
        self.layers.push(layer);
        self.composite_stale = true;
        self.emit(LayerEvent::Created { id });

        if self.active.is_none() {
            self.active = Some(id);
            self.emit(LayerEvent::ActiveChanged {
                previous: None,
                current: Some(id),
            });
        }
    }

    /// Make `id` the target of painting operations
    pub fn set_active_layer(&mut self, id: LayerId) -> PaintResult<()> {
        self.index_of(id)?;
        if self.active == Some(id) {
            return Ok(());
        }
        let previous = self.active.replace(id);
        debug!("LayerManager: active layer {:?} -> {}", previous, id);
        self.emit(LayerEvent::ActiveChanged {
            previous,
            current: Some(id),
        });
        Ok(())
    }

    /// Remove a layer.
    ///
    /// If it was active, the layer below it becomes active (or the new bottom
    /// layer when the bottom one was deleted, or none when the stack empties).
    pub fn delete_layer(&mut self, id: LayerId) -> PaintResult<()> {
        let index = self.index_of(id)?;
        self.layers.remove(index);
        self.composite_stale = true;
        info!("LayerManager: deleted layer {}", id);

        let handoff = (self.active == Some(id)).then(|| {
            let next = index
                .checked_sub(1)
                .and_then(|below| self.layers.get(below))
                .or_else(|| self.layers.first())
                .map(DrawLayer::id);
            self.active = next;
            next
        });

        self.emit(LayerEvent::Deleted { id });
        if let Some(next) = handoff {
            self.emit(LayerEvent::ActiveChanged {
                previous: Some(id),
                current: next,
            });
        }
        Ok(())
    }

    /// Move a layer to `new_index`, clamped to the stack.
    ///
    /// Returns the position the layer ended up at.
    pub fn reorder(&mut self, id: LayerId, new_index: usize) -> PaintResult<usize> {
        let from = self.index_of(id)?;
        let to = new_index.min(self.layers.len() - 1);
        if from == to {
            return Ok(to);
        }
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        self.composite_stale = true;
        debug!("LayerManager: moved layer {} from {} to {}", id, from, to);
        self.emit(LayerEvent::Reordered { id, from, to });
        Ok(to)
    }

    // --- Properties ---

    fn update_properties(
        &mut self,
        id: LayerId,
        f: impl FnOnce(&mut DrawLayer),
    ) -> PaintResult<()> {
        f(self.layer_mut(id)?);
        self.emit(LayerEvent::PropertiesChanged { id });
        Ok(())
    }

    pub fn rename_layer(&mut self, id: LayerId, name: impl Into<String>) -> PaintResult<()> {
        let name = name.into();
        self.update_properties(id, |layer| layer.set_name(name))
    }

    pub fn set_layer_visible(&mut self, id: LayerId, visible: bool) -> PaintResult<()> {
        self.update_properties(id, |layer| layer.set_visible(visible))
    }

    pub fn set_layer_locked(&mut self, id: LayerId, locked: bool) -> PaintResult<()> {
        self.update_properties(id, |layer| layer.set_locked(locked))
    }

    /// Set a layer's opacity, clamped to 0.0..=1.0
    pub fn set_layer_opacity(&mut self, id: LayerId, opacity: f32) -> PaintResult<()> {
        self.update_properties(id, |layer| layer.set_opacity(opacity))
    }

    pub fn set_layer_blend_mode(&mut self, id: LayerId, blend_mode: BlendMode) -> PaintResult<()> {
        self.update_properties(id, |layer| layer.set_blend_mode(blend_mode))
    }

    // --- Compositing ---

    /// Composite `layers` bottom to top onto a transparent buffer.
    ///
    /// Hidden layers contribute nothing.
    pub(crate) fn blend_stack<'a>(
        &self,
        layers: impl IntoIterator<Item = &'a DrawLayer>,
    ) -> PixelBuffer {
        let mut out = self.composite.clone();
        out.clear(Color::TRANSPARENT);
        for layer in layers.into_iter().filter(|layer| layer.is_visible()) {
            composite_onto(&mut out, layer.buffer(), layer.blend_mode(), layer.opacity());
        }
        out
    }

    /// Recompute the composite from the current stack.
    ///
    /// The new buffer is built separately and swapped in on completion.
    pub fn update_composite(&mut self) -> &PixelBuffer {
        self.composite = self.blend_stack(&self.layers);
        self.composite_stale = false;
        debug!(
            "LayerManager::update_composite: {} layers, {}x{}",
            self.layers.len(),
            self.width,
            self.height
        );
        &self.composite
    }

    /// Last computed composite; may lag behind the layers until
    /// [`Self::update_composite`] runs
    #[inline]
    pub fn composite(&self) -> &PixelBuffer {
        &self.composite
    }

    /// Whether any layer changed since the last composite
    #[inline]
    pub fn is_composite_stale(&self) -> bool {
        self.composite_stale
    }
}
