//! Drawing engine: gesture state machine over a layer stack
//!
//! This module connects:
//! - Pointer gestures (`begin_draw`, `continue_draw`, `end_draw`)
//! - The stroke rasterizer (stamp placement)
//! - The active layer (stamp application)
//! - Undo history and composite recomputation
//!
//! The engine is driven by its embedder: input arrives through the gesture
//! calls and [`DrawingEngine::tick`] refreshes the composite once per frame.

mod history;
mod session;

use easel_config::CanvasConfig;
use glam::{IVec2, Vec2};
use tracing::{debug, info, warn};

use crate::brush::Brush;
use crate::constants::DEFAULT_THUMBNAIL_SIZE;
use crate::error::{PaintError, PaintResult};
use crate::export::{encode, ExportFormat};
use crate::layer::{DrawLayer, Shape};
use crate::manager::{LayerInfo, LayerManager};
use crate::surface::PixelBuffer;
use crate::types::{Color, DirtyRect, LayerId, PaintMode};

pub use history::{History, UndoEntry};
pub use session::StrokeReport;

use session::StrokeSession;

#[derive(Debug)]
enum EngineState {
    Idle,
    Drawing(StrokeSession),
}

/// Gesture-driven painting on a [`LayerManager`]
#[derive(Debug)]
pub struct DrawingEngine {
    layers: LayerManager,
    state: EngineState,
    history: History,
    paint_mode: PaintMode,
    max_brush_size: u32,
    lossy_quality: u8,
    background: Color,
}

impl DrawingEngine {
    /// Create a `width` x `height` canvas with one transparent layer
    pub fn new(width: u32, height: u32) -> PaintResult<Self> {
        Self::from_config(&CanvasConfig::new(width, height))
    }

    /// Create a canvas from a validated config.
    ///
    /// The initial layer is filled with the configured background and is
    /// active.
    pub fn from_config(config: &CanvasConfig) -> PaintResult<Self> {
        config.validate()?;
        let background = Color::from_array(config.background);

        let mut layers = LayerManager::new(config.width, config.height)?;
        let id = layers.create_layer(config.initial_layer_name.clone())?;
        layers.layer_mut(id)?.clear(background)?;
        layers.update_composite();

        info!(
            "DrawingEngine: created {}x{} canvas (undo depth {})",
            config.width, config.height, config.max_undo_levels
        );
        Ok(Self {
            layers,
            state: EngineState::Idle,
            history: History::new(config.max_undo_levels),
            paint_mode: PaintMode::Paint,
            max_brush_size: config.max_brush_size,
            lossy_quality: config.lossy_quality,
            background,
        })
    }

    pub fn layers(&self) -> &LayerManager {
        &self.layers
    }

    /// Direct stack access for structure and property edits.
    ///
    /// Pixel edits made through here bypass undo history.
    pub fn layers_mut(&mut self) -> &mut LayerManager {
        &mut self.layers
    }

    /// Layer panel contents with default-sized thumbnails
    pub fn layer_infos(&self) -> PaintResult<Vec<LayerInfo>> {
        self.layers.layer_infos(DEFAULT_THUMBNAIL_SIZE)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Check if a stroke is in progress
    pub fn is_drawing(&self) -> bool {
        matches!(self.state, EngineState::Drawing(_))
    }

    pub fn paint_mode(&self) -> PaintMode {
        self.paint_mode
    }

    /// Paint or erase; takes effect from the next `begin_draw`
    pub fn set_paint_mode(&mut self, mode: PaintMode) {
        self.paint_mode = mode;
    }

    /// JPEG at the configured default quality
    pub fn lossy_format(&self) -> ExportFormat {
        ExportFormat::Jpeg {
            quality: self.lossy_quality,
        }
    }

    // --- Gestures ---

    /// Start a stroke on the active layer and apply its first stamp.
    ///
    /// Brush and color are captured for the whole gesture. Fails without
    /// changing state if a stroke is already in progress, there is no
    /// active layer, or the active layer is locked.
    pub fn begin_draw(
        &mut self,
        position: Vec2,
        brush: &Brush,
        color: Color,
        pressure: f32,
    ) -> PaintResult<StrokeReport> {
        if self.is_drawing() {
            warn!("DrawingEngine::begin_draw: stroke already in progress");
            return Err(PaintError::InvalidStateTransition("begin_draw while drawing"));
        }
        let id = self.layers.active_id().ok_or(PaintError::NoActiveLayer)?;
        let layer = self.layers.layer(id)?;
        layer.ensure_unlocked()?;
        let before = layer.buffer().clone();

        let brush = brush.clone().with_size(brush.size.min(self.max_brush_size));
        debug!(
            "DrawingEngine::begin_draw: layer {} brush '{}' size {} mode {:?} at ({:.1}, {:.1})",
            id, brush.name, brush.size, self.paint_mode, position.x, position.y
        );
        let mut session = StrokeSession::new(id, brush, color, self.paint_mode);
        let report = session.feed(&mut self.layers, position, pressure)?;

        self.history.record(id, before);
        self.state = EngineState::Drawing(session);
        Ok(report)
    }

    /// Add a pointer sample to the current stroke
    pub fn continue_draw(&mut self, position: Vec2, pressure: f32) -> PaintResult<StrokeReport> {
        match &mut self.state {
            EngineState::Drawing(session) => session.feed(&mut self.layers, position, pressure),
            EngineState::Idle => {
                warn!("DrawingEngine::continue_draw: no stroke in progress");
                Err(PaintError::InvalidStateTransition("continue_draw without begin_draw"))
            }
        }
    }

    /// Apply the final sample and end the stroke.
    ///
    /// The engine returns to Idle even if the final sample fails.
    pub fn end_draw(&mut self, position: Vec2, pressure: f32) -> PaintResult<StrokeReport> {
        let EngineState::Drawing(mut session) =
            std::mem::replace(&mut self.state, EngineState::Idle)
        else {
            warn!("DrawingEngine::end_draw: no stroke in progress");
            return Err(PaintError::InvalidStateTransition("end_draw without begin_draw"));
        };

        let report = session.feed(&mut self.layers, position, pressure);
        info!(
            "DrawingEngine: stroke on layer {} finished, {} stamps, dirty {:?}",
            session.layer,
            session.stamp_count(),
            session.dirty
        );
        report
    }

    // --- One-shot edits ---

    /// Run `edit` on the active layer with an undo snapshot taken first
    fn edit_active<T>(
        &mut self,
        op: &'static str,
        edit: impl FnOnce(&mut DrawLayer) -> PaintResult<T>,
    ) -> PaintResult<T> {
        if self.is_drawing() {
            warn!("DrawingEngine::{}: stroke in progress", op);
            return Err(PaintError::InvalidStateTransition(op));
        }
        let id = self.layers.active_id().ok_or(PaintError::NoActiveLayer)?;
        let layer = self.layers.layer_mut(id)?;
        layer.ensure_unlocked()?;
        let before = layer.buffer().clone();

        let result = edit(layer)?;
        self.history.record(id, before);
        Ok(result)
    }

    /// Bucket fill on the active layer; returns the number of pixels recolored
    pub fn fill(&mut self, seed: IVec2, color: Color, tolerance: u8) -> PaintResult<usize> {
        self.edit_active("fill", |layer| layer.flood_fill(seed, color, tolerance))
    }

    /// Draw a shape on the active layer
    pub fn draw_shape(
        &mut self,
        shape: Shape,
        brush: &Brush,
        color: Color,
        filled: bool,
    ) -> PaintResult<Option<DirtyRect>> {
        let brush = brush.clone().with_size(brush.size.min(self.max_brush_size));
        self.edit_active("draw_shape", |layer| layer.draw_shape(shape, &brush, color, filled))
    }

    /// Fill the whole active layer with `color`
    pub fn clear_active(&mut self, color: Color) -> PaintResult<()> {
        self.edit_active("clear_active", |layer| layer.clear(color))
    }

    // --- History ---

    /// Revert the most recent edit. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> PaintResult<bool> {
        if self.is_drawing() {
            return Err(PaintError::InvalidStateTransition("undo while drawing"));
        }
        Ok(self.history.undo(&mut self.layers))
    }

    /// Re-apply the most recently undone edit
    pub fn redo(&mut self) -> PaintResult<bool> {
        if self.is_drawing() {
            return Err(PaintError::InvalidStateTransition("redo while drawing"));
        }
        Ok(self.history.redo(&mut self.layers))
    }

    // --- Output ---

    /// Recompute the composite if anything changed since the last tick.
    ///
    /// Returns true if a recompute ran.
    pub fn tick(&mut self) -> bool {
        if !self.layers.is_composite_stale() {
            return false;
        }
        self.layers.update_composite();
        true
    }

    /// Last computed composite
    pub fn composite(&self) -> &PixelBuffer {
        self.layers.composite()
    }

    /// Encode the up-to-date composite
    pub fn export(&mut self, format: ExportFormat) -> PaintResult<Vec<u8>> {
        self.tick();
        encode(self.layers.composite(), format, self.background)
    }

    /// Decode an image and add it as a new layer at `offset`
    pub fn import(
        &mut self,
        name: impl Into<String>,
        bytes: &[u8],
        offset: IVec2,
    ) -> PaintResult<LayerId> {
        let image = crate::export::decode_image(bytes)?;
        self.layers.import_layer(name, &image, offset)
    }
}
