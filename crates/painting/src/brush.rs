//! Brush configuration and presets
//!
//! A [`Brush`] is plain value data. The mask shape is selected by a single
//! match on [`BrushKind`] in [`crate::mask::generate_stamp_mask`].

use std::borrow::Cow;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::{MIN_SPACING, MIN_SPACING_FRACTION};
use crate::mask::StampMask;

/// Brush tip variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BrushKind {
    Round,
    Square,
    Soft,
    Airbrush,
    Pencil,
    Marker,
    /// Caller-supplied coverage mask, resampled to the effective size
    #[serde(skip)]
    Custom(Arc<StampMask>),
}

/// Immutable brush configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    /// Human-readable name
    pub name: Cow<'static, str>,
    /// Tip shape
    pub kind: BrushKind,
    /// Diameter in pixels
    pub size: u32,
    /// Edge falloff: 0.0 = soft, 1.0 = hard
    pub hardness: f32,
    /// Per-stamp alpha multiplier 0.0-1.0
    pub opacity: f32,
    /// Distance between stamps as fraction of size (e.g. 0.25 = 25% of diameter)
    pub spacing: f32,
    /// Per-stamp accumulation rate 0.0-1.0
    pub flow: f32,
    /// Scale size and opacity by pen pressure
    pub use_pressure: bool,
}

impl Brush {
    pub const ROUND: Brush =
        Brush::preset("Round", BrushKind::Round, 12, 0.8, 1.0, 0.25, 1.0, true);
    pub const SQUARE: Brush =
        Brush::preset("Square", BrushKind::Square, 12, 1.0, 1.0, 0.25, 1.0, false);
    pub const SOFT: Brush = Brush::preset("Soft", BrushKind::Soft, 32, 0.0, 0.8, 0.15, 1.0, true);
    pub const AIRBRUSH: Brush =
        Brush::preset("Airbrush", BrushKind::Airbrush, 48, 0.0, 0.6, 0.1, 0.2, true);
    pub const PENCIL: Brush =
        Brush::preset("Pencil", BrushKind::Pencil, 2, 1.0, 1.0, 0.5, 1.0, false);
    pub const MARKER: Brush =
        Brush::preset("Marker", BrushKind::Marker, 16, 0.9, 0.7, 0.2, 1.0, false);

    #[allow(clippy::too_many_arguments)]
    const fn preset(
        name: &'static str,
        kind: BrushKind,
        size: u32,
        hardness: f32,
        opacity: f32,
        spacing: f32,
        flow: f32,
        use_pressure: bool,
    ) -> Self {
        Self {
            name: Cow::Borrowed(name),
            kind,
            size,
            hardness,
            opacity,
            spacing,
            flow,
            use_pressure,
        }
    }

    /// All built-in presets
    pub fn presets() -> [Brush; 6] {
        [
            Self::ROUND,
            Self::SQUARE,
            Self::SOFT,
            Self::AIRBRUSH,
            Self::PENCIL,
            Self::MARKER,
        ]
    }

    /// Look up a built-in preset by name (case-insensitive)
    pub fn preset_named(name: &str) -> Option<Brush> {
        Self::presets()
            .into_iter()
            .find(|b| b.name.eq_ignore_ascii_case(name))
    }

    /// Create a brush from a caller-supplied mask
    pub fn custom(name: impl Into<String>, mask: StampMask) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            size: mask.size(),
            kind: BrushKind::Custom(Arc::new(mask)),
            hardness: 1.0,
            opacity: 1.0,
            spacing: 0.25,
            flow: 1.0,
            use_pressure: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Cow::Owned(name.into());
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size.max(1);
        self
    }

    pub fn with_hardness(mut self, hardness: f32) -> Self {
        self.hardness = hardness.clamp(0.0, 1.0);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing.max(MIN_SPACING_FRACTION); // Prevent zero spacing
        self
    }

    pub fn with_flow(mut self, flow: f32) -> Self {
        self.flow = flow.clamp(0.0, 1.0);
        self
    }

    pub fn with_pressure(mut self, use_pressure: bool) -> Self {
        self.use_pressure = use_pressure;
        self
    }

    /// Minimum distance between consecutive stamps, in pixels
    pub fn effective_spacing(&self) -> f32 {
        (self.size as f32 * self.spacing).max(MIN_SPACING)
    }

    #[inline]
    fn pressure_factor(&self, pressure: f32) -> f32 {
        if self.use_pressure {
            if pressure.is_nan() {
                0.0
            } else {
                pressure.clamp(0.0, 1.0)
            }
        } else {
            1.0
        }
    }

    /// Stamp diameter for the given pressure (never below one pixel)
    pub fn effective_size(&self, pressure: f32) -> u32 {
        let size = (self.size.max(1) as f32 * self.pressure_factor(pressure)).round() as u32;
        size.max(1)
    }

    /// Opacity for the given pressure
    pub fn effective_opacity(&self, pressure: f32) -> f32 {
        self.opacity.clamp(0.0, 1.0) * self.pressure_factor(pressure)
    }

    /// Alpha multiplier applied to every mask cell of one stamp
    pub fn stamp_alpha(&self, pressure: f32) -> f32 {
        self.effective_opacity(pressure) * self.flow.clamp(0.0, 1.0)
    }
}

impl Default for Brush {
    fn default() -> Self {
        Self::ROUND
    }
}
