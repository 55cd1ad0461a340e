//! Draw layers: one pixel buffer plus compositing metadata

mod fill;
mod shapes;
mod stamp;

pub use shapes::Shape;

use crate::error::{PaintError, PaintResult};
use crate::surface::PixelBuffer;
use crate::types::{BlendMode, Color, LayerId};

/// A single paintable layer.
///
/// Visibility only affects compositing; a hidden layer can still be painted.
/// A locked layer rejects every pixel mutation with [`PaintError::LayerLocked`].
#[derive(Debug, Clone)]
pub struct DrawLayer {
    id: LayerId,
    name: String,
    visible: bool,
    locked: bool,
    opacity: f32,
    blend_mode: BlendMode,
    buffer: PixelBuffer,
}

impl DrawLayer {
    /// Create a fully transparent, visible, unlocked Normal layer
    pub fn new(id: LayerId, name: impl Into<String>, width: u32, height: u32) -> PaintResult<Self> {
        Ok(Self::from_buffer(id, name, PixelBuffer::new(width, height)?))
    }

    /// Wrap an existing buffer
    pub fn from_buffer(id: LayerId, name: impl Into<String>, buffer: PixelBuffer) -> Self {
        Self {
            id,
            name: name.into(),
            visible: true,
            locked: false,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            buffer,
        }
    }

    #[inline]
    pub fn id(&self) -> LayerId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[inline]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    #[inline]
    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    #[inline]
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Set opacity, clamped to 0.0..=1.0
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn set_blend_mode(&mut self, blend_mode: BlendMode) {
        self.blend_mode = blend_mode;
    }

    pub(crate) fn set_id(&mut self, id: LayerId) {
        self.id = id;
    }

    #[inline]
    pub(crate) fn ensure_unlocked(&self) -> PaintResult<()> {
        if self.locked {
            return Err(PaintError::LayerLocked(self.id));
        }
        Ok(())
    }

    /// Mutable buffer access for unlocked layers
    pub fn buffer_mut(&mut self) -> PaintResult<&mut PixelBuffer> {
        self.ensure_unlocked()?;
        Ok(&mut self.buffer)
    }

    /// Swap in a new buffer of the same size, returning the old one.
    ///
    /// Used by undo/redo and merges; bypasses the lock check.
    pub(crate) fn replace_buffer(&mut self, buffer: PixelBuffer) -> PixelBuffer {
        debug_assert_eq!(
            (buffer.width(), buffer.height()),
            (self.buffer.width(), self.buffer.height())
        );
        std::mem::replace(&mut self.buffer, buffer)
    }

    /// Fill the whole layer with one color
    pub fn clear(&mut self, color: Color) -> PaintResult<()> {
        self.ensure_unlocked()?;
        self.buffer.clear(color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_layer_defaults() {
        let layer = DrawLayer::new(LayerId(3), "Ink", 8, 4).unwrap();
        assert_eq!(layer.id(), LayerId(3));
        assert_eq!(layer.name(), "Ink");
        assert!(layer.is_visible());
        assert!(!layer.is_locked());
        assert_eq!(layer.opacity(), 1.0);
        assert_eq!(layer.blend_mode(), BlendMode::Normal);
        assert_eq!((layer.width(), layer.height()), (8, 4));
        assert!(layer.buffer().pixels().iter().all(|&p| p == Color::TRANSPARENT));
    }

    #[test]
    fn test_invalid_layer_size() {
        assert!(matches!(
            DrawLayer::new(LayerId(0), "Bad", 0, 4),
            Err(PaintError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_opacity_clamped() {
        let mut layer = DrawLayer::new(LayerId(0), "L", 2, 2).unwrap();
        layer.set_opacity(1.5);
        assert_eq!(layer.opacity(), 1.0);
        layer.set_opacity(-0.5);
        assert_eq!(layer.opacity(), 0.0);
    }

    #[test]
    fn test_locked_layer_rejects_clear() {
        let mut layer = DrawLayer::new(LayerId(0), "L", 2, 2).unwrap();
        layer.set_locked(true);
        assert!(matches!(layer.clear(Color::RED), Err(PaintError::LayerLocked(LayerId(0)))));
        assert!(layer.buffer_mut().is_err());
        assert_eq!(layer.buffer().get(0, 0), Color::TRANSPARENT);

        layer.set_locked(false);
        layer.clear(Color::RED).unwrap();
        assert_eq!(layer.buffer().get(1, 1), Color::RED);
    }
}
