//! Easel painting core - layered raster canvas and brush engine
//!
//! This crate provides the drawing core of the canvas:
//! - [`surface::PixelBuffer`] - Bounds-checked straight-alpha RGBA8 buffer
//! - [`brush`] - Brush configuration and presets
//! - [`mask`] - Stamp mask generation per brush kind
//! - [`stroke`] - Pointer samples to spaced stamp placements
//! - [`blend`] - Per-mode channel blending and "over" compositing
//! - [`layer`] - Draw layers: stamps, flood fill, shapes
//! - [`manager`] - Layer stack, merges, composite and events
//! - [`engine`] - Gesture state machine with undo history
//! - [`export`] - PNG/JPEG encoding and image import

pub mod blend;
pub mod brush;
pub mod constants;
pub mod engine;
pub mod error;
pub mod export;
pub mod layer;
pub mod manager;
pub mod mask;
pub mod stroke;
pub mod surface;
pub mod types;

pub use blend::*;
pub use brush::*;
pub use constants::*;
pub use engine::*;
pub use error::*;
pub use export::*;
pub use layer::*;
pub use manager::*;
pub use mask::*;
pub use stroke::*;
pub use surface::*;
pub use types::*;

pub use easel_config::CanvasConfig;
