//! Stamp mask generation
//!
//! A [`StampMask`] is a square coverage patch centered on the stamp position.
//! Cell (i, j) maps to pixel offset `(i + offset, j + offset)` where
//! `offset = -(size - 1) / 2`.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::brush::{Brush, BrushKind};
use crate::constants::{MASK_CACHE_CAPACITY, SOFT_DECAY};
use crate::error::{PaintError, PaintResult};

/// Square coverage patch for one brush stamp, values in 0.0..=1.0
#[derive(Debug, Clone, PartialEq)]
pub struct StampMask {
    size: u32,
    coverage: Vec<f32>,
}

impl StampMask {
    /// Wrap caller-provided coverage (row-major, `size * size` values).
    ///
    /// Values are clamped into 0.0..=1.0.
    pub fn from_coverage(size: u32, coverage: Vec<f32>) -> PaintResult<Self> {
        if size == 0 || coverage.len() != (size as usize) * (size as usize) {
            return Err(PaintError::InvalidDimensions {
                width: size,
                height: size,
            });
        }
        let coverage = coverage
            .into_iter()
            .map(|c| if c.is_finite() { c.clamp(0.0, 1.0) } else { 0.0 })
            .collect();
        Ok(Self { size, coverage })
    }

    fn from_fn(size: u32, f: impl Fn(f32, f32) -> f32) -> Self {
        let half = size as f32 / 2.0;
        let mut coverage = Vec::with_capacity((size * size) as usize);
        for j in 0..size {
            for i in 0..size {
                // Cell center relative to patch center
                let dx = i as f32 + 0.5 - half;
                let dy = j as f32 + 0.5 - half;
                coverage.push(f(dx, dy).clamp(0.0, 1.0));
            }
        }
        Self { size, coverage }
    }

    /// Side length in pixels
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Pixel offset of cell 0 relative to the stamp center pixel
    #[inline]
    pub fn offset(&self) -> i32 {
        -((self.size as i32 - 1) / 2)
    }

    /// Coverage of cell (i, j), 0.0 outside the patch
    #[inline]
    pub fn coverage(&self, i: u32, j: u32) -> f32 {
        if i >= self.size || j >= self.size {
            return 0.0;
        }
        self.coverage[(j * self.size + i) as usize]
    }

    /// Coverage at a pixel offset (dx, dy) from the stamp center
    #[inline]
    pub fn coverage_at(&self, dx: i32, dy: i32) -> f32 {
        let i = dx - self.offset();
        let j = dy - self.offset();
        if i < 0 || j < 0 {
            return 0.0;
        }
        self.coverage(i as u32, j as u32)
    }

    /// Iterate `(dx, dy, coverage)` over cells with non-zero coverage
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, f32)> + '_ {
        let offset = self.offset();
        let size = self.size;
        self.coverage
            .iter()
            .enumerate()
            .filter(|(_, c)| **c > 0.0)
            .map(move |(idx, &c)| {
                let i = (idx as u32 % size) as i32;
                let j = (idx as u32 / size) as i32;
                (i + offset, j + offset, c)
            })
    }

    /// Nearest-neighbour resample to another side length
    fn resampled(&self, size: u32) -> Self {
        if size == self.size {
            return self.clone();
        }
        let mut coverage = Vec::with_capacity((size * size) as usize);
        for j in 0..size {
            let sj = ((j as u64 * self.size as u64) / size as u64) as u32;
            for i in 0..size {
                let si = ((i as u64 * self.size as u64) / size as u64) as u32;
                coverage.push(self.coverage(si, sj));
            }
        }
        Self { size, coverage }
    }
}

/// Calculate falloff based on hardness
/// distance_normalized is 0 at center, 1 at edge
/// hardness is 0.0 (soft) to 1.0 (hard)
///
/// Coverage stays 1 out to `hardness` of the radius, then falls to 0 at the
/// edge along a ramp that is linear at hardness 0 and approaches a smoothstep
/// shoulder as hardness grows.
#[inline]
pub fn calculate_hardness_falloff(distance_normalized: f32, hardness: f32) -> f32 {
    if distance_normalized > 1.0 {
        return 0.0;
    }
    if hardness >= 1.0 {
        // Pure hard edge
        return 1.0;
    }
    let hardness = hardness.max(0.0);
    let t = distance_normalized.max(0.0);
    let u = ((t - hardness) / (1.0 - hardness)).clamp(0.0, 1.0);
    let linear = 1.0 - u;
    let smooth = 1.0 - u * u * (3.0 - 2.0 * u);
    linear * (1.0 - hardness) + smooth * hardness
}

/// Rasterize one dab of `brush` into a square patch of side `effective_size`.
pub fn generate_stamp_mask(brush: &Brush, effective_size: u32) -> StampMask {
    let size = effective_size.max(1);
    let radius = size as f32 / 2.0;
    let hardness = brush.hardness.clamp(0.0, 1.0);
    let dist = move |dx: f32, dy: f32| (dx * dx + dy * dy).sqrt() / radius;

    match &brush.kind {
        BrushKind::Round => {
            StampMask::from_fn(size, |dx, dy| calculate_hardness_falloff(dist(dx, dy), hardness))
        }
        BrushKind::Square => StampMask::from_fn(size, |_, _| 1.0),
        BrushKind::Soft => StampMask::from_fn(size, |dx, dy| soft_falloff(dist(dx, dy), hardness)),
        BrushKind::Airbrush => {
            let flow = brush.flow.clamp(0.0, 1.0);
            StampMask::from_fn(size, |dx, dy| soft_falloff(dist(dx, dy), hardness) * flow)
        }
        BrushKind::Pencil => StampMask::from_fn(size, |dx, dy| {
            if calculate_hardness_falloff(dist(dx, dy), hardness) >= 0.5 {
                1.0
            } else {
                0.0
            }
        }),
        BrushKind::Marker => StampMask::from_fn(size, |dx, dy| {
            (calculate_hardness_falloff(dist(dx, dy), hardness) * 2.0).round() / 2.0
        }),
        BrushKind::Custom(mask) => mask.resampled(size),
    }
}

#[inline]
fn soft_falloff(t: f32, hardness: f32) -> f32 {
    calculate_hardness_falloff(t, hardness) * (-SOFT_DECAY * t * t).exp()
}

/// Per-stroke cache of masks keyed by effective size.
///
/// Only valid for a single brush; a stroke session owns one alongside its
/// brush snapshot.
#[derive(Debug, Default)]
pub struct MaskCache {
    masks: HashMap<u32, Arc<StampMask>>,
}

impl MaskCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the mask for `effective_size`, generating it on first use
    pub fn get(&mut self, brush: &Brush, effective_size: u32) -> Arc<StampMask> {
        if let Some(mask) = self.masks.get(&effective_size) {
            return Arc::clone(mask);
        }
        if self.masks.len() >= MASK_CACHE_CAPACITY {
            self.masks.clear();
        }
        debug!("MaskCache: generating {:?} mask of size {}", brush.kind, effective_size);
        let mask = Arc::new(generate_stamp_mask(brush, effective_size));
        self.masks.insert(effective_size, Arc::clone(&mask));
        mask
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZES: [u32; 7] = [1, 2, 3, 5, 8, 17, 32];
    const HARDNESS: [f32; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

    fn kinds() -> Vec<BrushKind> {
        vec![
            BrushKind::Round,
            BrushKind::Square,
            BrushKind::Soft,
            BrushKind::Airbrush,
            BrushKind::Pencil,
            BrushKind::Marker,
        ]
    }

    #[test]
    fn test_hardness_falloff() {
        // Hard brush (hardness = 1.0)
        assert_eq!(calculate_hardness_falloff(0.0, 1.0), 1.0);
        assert_eq!(calculate_hardness_falloff(0.5, 1.0), 1.0);
        assert_eq!(calculate_hardness_falloff(1.0, 1.0), 1.0);
        assert_eq!(calculate_hardness_falloff(1.01, 1.0), 0.0);

        // Soft brush (hardness = 0.0) is a linear ramp
        assert_eq!(calculate_hardness_falloff(0.0, 0.0), 1.0);
        assert_eq!(calculate_hardness_falloff(0.5, 0.0), 0.5);
        assert_eq!(calculate_hardness_falloff(1.0, 0.0), 0.0);

        // Medium brush keeps a solid core
        assert_eq!(calculate_hardness_falloff(0.4, 0.5), 1.0);
        let mid = calculate_hardness_falloff(0.75, 0.5);
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn test_coverage_in_unit_range() {
        for kind in kinds() {
            for size in SIZES {
                for hardness in HARDNESS {
                    let brush = Brush { kind: kind.clone(), hardness, ..Brush::ROUND };
                    let mask = generate_stamp_mask(&brush, size);
                    assert_eq!(mask.size(), size);
                    for (_, _, c) in mask.iter() {
                        assert!(
                            (0.0..=1.0).contains(&c),
                            "{kind:?} size={size} h={hardness} c={c}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_round_and_soft_decrease_outward() {
        for kind in [BrushKind::Round, BrushKind::Soft, BrushKind::Airbrush] {
            for size in SIZES {
                for hardness in HARDNESS {
                    let brush = Brush { kind: kind.clone(), hardness, ..Brush::ROUND };
                    let mask = generate_stamp_mask(&brush, size);
                    let half = size as f32 / 2.0;
                    let mut cells: Vec<(f32, f32)> = (0..size)
                        .flat_map(|j| (0..size).map(move |i| (i, j)))
                        .map(|(i, j)| {
                            let dx = i as f32 + 0.5 - half;
                            let dy = j as f32 + 0.5 - half;
                            ((dx * dx + dy * dy).sqrt(), mask.coverage(i, j))
                        })
                        .collect();
                    cells.sort_by(|a, b| a.0.total_cmp(&b.0));
                    for pair in cells.windows(2) {
                        assert!(
                            pair[1].1 <= pair[0].1 + 1e-6,
                            "{kind:?} size={size} h={hardness}: {:?} -> {:?}",
                            pair[0],
                            pair[1]
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_single_pixel_mask_is_full() {
        let brush = Brush::ROUND.with_hardness(1.0);
        let mask = generate_stamp_mask(&brush, 1);
        assert_eq!(mask.offset(), 0);
        assert_eq!(mask.coverage_at(0, 0), 1.0);
        assert_eq!(mask.coverage_at(1, 0), 0.0);
    }

    #[test]
    fn test_square_mask_covers_patch() {
        let mask = generate_stamp_mask(&Brush::SQUARE, 4);
        assert_eq!(mask.iter().count(), 16);
        assert_eq!(mask.offset(), -1);
        assert_eq!(mask.coverage_at(-1, -1), 1.0);
        assert_eq!(mask.coverage_at(2, 2), 1.0);
    }

    #[test]
    fn test_pencil_is_binary_and_marker_is_quantized() {
        let pencil = generate_stamp_mask(&Brush::PENCIL.with_hardness(0.3), 9);
        assert!(pencil.iter().all(|(_, _, c)| c == 1.0));

        let marker = generate_stamp_mask(&Brush::MARKER.with_hardness(0.0), 9);
        assert!(marker.iter().all(|(_, _, c)| c == 0.5 || c == 1.0));
    }

    #[test]
    fn test_airbrush_scaled_by_flow() {
        let soft = Brush { kind: BrushKind::Soft, hardness: 0.0, ..Brush::ROUND };
        let air = Brush { kind: BrushKind::Airbrush, hardness: 0.0, flow: 0.5, ..Brush::ROUND };
        let a = generate_stamp_mask(&soft, 8);
        let b = generate_stamp_mask(&air, 8);
        assert!((b.coverage(4, 4) - a.coverage(4, 4) * 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_custom_mask_resampled() {
        let mask = StampMask::from_coverage(2, vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        let brush = Brush::custom("Checker", mask.clone());

        assert_eq!(generate_stamp_mask(&brush, 2), mask);

        let big = generate_stamp_mask(&brush, 4);
        assert_eq!(big.coverage(0, 0), 1.0);
        assert_eq!(big.coverage(3, 0), 0.0);
        assert_eq!(big.coverage(3, 3), 1.0);
    }

    #[test]
    fn test_custom_mask_validation() {
        assert!(StampMask::from_coverage(3, vec![1.0; 4]).is_err());
        let mask = StampMask::from_coverage(1, vec![7.0]).unwrap();
        assert_eq!(mask.coverage(0, 0), 1.0);
    }

    #[test]
    fn test_mask_cache_reuses_masks() {
        let mut cache = MaskCache::new();
        let brush = Brush::ROUND;
        let a = cache.get(&brush, 10);
        let b = cache.get(&brush, 10);
        assert!(Arc::ptr_eq(&a, &b));
        cache.get(&brush, 11);
        assert_eq!(cache.len(), 2);
    }
}
