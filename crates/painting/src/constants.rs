/// Floating point slack used when comparing stamp distances.
pub const SPACING_EPSILON: f32 = 1e-3;

/// Minimum effective stamp spacing in pixels.
pub const MIN_SPACING: f32 = 1.0;

/// Smallest brush spacing fraction accepted by `Brush::with_spacing`.
pub const MIN_SPACING_FRACTION: f32 = 0.01;

/// Falloff exponent for Soft and Airbrush masks (`exp(-k * t^2)`).
pub const SOFT_DECAY: f32 = 2.5;

/// Default side length of layer thumbnails.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 64;

/// Number of stamp masks kept per stroke session.
pub const MASK_CACHE_CAPACITY: usize = 16;
