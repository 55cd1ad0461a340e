//! Error types for the drawing core.

use crate::types::LayerId;

/// Recoverable errors reported by buffer, layer, manager and engine operations.
///
/// A failed operation leaves all state unchanged.
#[derive(Debug, thiserror::Error)]
pub enum PaintError {
    #[error("Invalid buffer dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Unknown layer {0}")]
    InvalidReference(LayerId),

    #[error("Layer {0} is locked")]
    LayerLocked(LayerId),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(&'static str),

    #[error("Layer {0} has no layer below to merge into")]
    NoMergeTarget(LayerId),

    #[error("No active layer")]
    NoActiveLayer,

    #[error("No layers to merge")]
    NothingToMerge,

    #[error("Export quality {0} is outside 0..=100")]
    InvalidQuality(u8),

    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error(transparent)]
    Config(#[from] easel_config::ConfigError),
}

pub type PaintResult<T> = Result<T, PaintError>;
