//! Shared configuration for Easel
//!
//! This crate provides the single source of truth for canvas dimensions,
//! history depth, brush limits and export defaults shared by every
//! embedding of the drawing core.

use serde::{Deserialize, Serialize};

/// Default canvas width in pixels
pub const DEFAULT_WIDTH: u32 = 1024;

/// Default canvas height in pixels
pub const DEFAULT_HEIGHT: u32 = 1024;

/// Default number of undo steps kept per canvas
pub const DEFAULT_MAX_UNDO_LEVELS: usize = 20;

/// Largest brush diameter accepted by the engine
pub const DEFAULT_MAX_BRUSH_SIZE: u32 = 512;

/// Default quality for lossy export (0..=100)
pub const DEFAULT_LOSSY_QUALITY: u8 = 90;

/// Errors raised while loading or validating a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid canvas dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Maximum brush size must be at least 1")]
    InvalidBrushLimit,

    #[error("Lossy quality {0} is outside 0..=100")]
    InvalidQuality(u8),
}

/// Canvas and engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Straight-alpha RGBA the initial layer is filled with
    pub background: [u8; 4],
    /// Name given to the layer created with the canvas
    pub initial_layer_name: String,
    /// Undo snapshots kept before the oldest is dropped
    pub max_undo_levels: usize,
    /// Brush diameters are clamped to this value
    pub max_brush_size: u32,
    /// Quality used for lossy export when the caller does not pick one
    pub lossy_quality: u8,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            background: [0, 0, 0, 0],
            initial_layer_name: "Layer 1".to_string(),
            max_undo_levels: DEFAULT_MAX_UNDO_LEVELS,
            max_brush_size: DEFAULT_MAX_BRUSH_SIZE,
            lossy_quality: DEFAULT_LOSSY_QUALITY,
        }
    }
}

impl CanvasConfig {
    /// Create a config with the given canvas dimensions and defaults elsewhere
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Parse a config from JSON text and validate it.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the config as pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the invariants the drawing core relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.max_brush_size == 0 {
            return Err(ConfigError::InvalidBrushLimit);
        }
        if self.lossy_quality > 100 {
            return Err(ConfigError::InvalidQuality(self.lossy_quality));
        }
        Ok(())
    }

    /// Total pixel count of one layer
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CanvasConfig::default();
        assert_eq!(config.width, DEFAULT_WIDTH);
        assert_eq!(config.height, DEFAULT_HEIGHT);
        assert_eq!(config.max_undo_levels, DEFAULT_MAX_UNDO_LEVELS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = CanvasConfig::from_json_str(r#"{ "width": 64, "height": 32 }"#).unwrap();
        assert_eq!(config.width, 64);
        assert_eq!(config.height, 32);
        assert_eq!(config.lossy_quality, DEFAULT_LOSSY_QUALITY);
        assert_eq!(config.pixel_count(), 2048);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let err = CanvasConfig::from_json_str(r#"{ "width": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDimensions { width: 0, .. }));
    }

    #[test]
    fn test_bad_quality_rejected() {
        let config = CanvasConfig {
            lossy_quality: 101,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidQuality(101))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            CanvasConfig::from_json_str("{ width: "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let config = CanvasConfig::new(300, 200);
        let text = config.to_json_string().unwrap();
        assert_eq!(CanvasConfig::from_json_str(&text).unwrap(), config);
    }
}
