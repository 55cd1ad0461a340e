//! Stroke rasterization: pointer samples to spaced stamp placements
//!
//! The rasterizer interpolates between input samples so fast strokes leave
//! no gaps, and never places a stamp closer than the effective spacing to the
//! previous one so slow strokes stay cheap. Spacing is measured from the last
//! emitted stamp: the next stamp lands where the path first leaves the circle
//! of radius `spacing` around it.

use glam::Vec2;
use tracing::{debug, warn};

use crate::brush::Brush;
use crate::constants::{MIN_SPACING, SPACING_EPSILON};

/// One pointer sample in canvas pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeSample {
    pub position: Vec2,
    /// Pen pressure 0.0-1.0 (1.0 for devices without pressure)
    pub pressure: f32,
}

impl StrokeSample {
    /// Pressure is clamped to 0.0..=1.0; NaN pressure reads as 0.0
    pub fn new(position: Vec2, pressure: f32) -> Self {
        let pressure = if pressure.is_nan() {
            0.0
        } else {
            pressure.clamp(0.0, 1.0)
        };
        Self { position, pressure }
    }

    /// Whether the position can be placed on a canvas
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
    }

    /// Sample at full pressure
    pub fn at(x: f32, y: f32) -> Self {
        Self::new(Vec2::new(x, y), 1.0)
    }
}

/// Where a single stamp lands and with what pressure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampPlacement {
    pub position: Vec2,
    pub pressure: f32,
}

/// Stateful converter from a gesture's samples to stamp placements
#[derive(Debug, Clone)]
pub struct StrokeRasterizer {
    spacing: f32,
    /// Previous raw input sample (None if stroke not started)
    last_sample: Option<StrokeSample>,
    /// Position of the last emitted stamp
    last_stamp: Option<Vec2>,
    stamp_count: usize,
}

impl StrokeRasterizer {
    /// Create a rasterizer with the given spacing in pixels (floored at 1)
    pub fn new(spacing: f32) -> Self {
        let spacing = if spacing.is_finite() {
            spacing.max(MIN_SPACING)
        } else {
            MIN_SPACING
        };
        Self {
            spacing,
            last_sample: None,
            last_stamp: None,
            stamp_count: 0,
        }
    }

    /// Create a rasterizer using the brush's effective spacing
    pub fn for_brush(brush: &Brush) -> Self {
        Self::new(brush.effective_spacing())
    }

    #[inline]
    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    /// Stamps emitted since the last reset
    #[inline]
    pub fn stamp_count(&self) -> usize {
        self.stamp_count
    }

    /// Whether a sample has been fed since the last reset
    #[inline]
    pub fn is_started(&self) -> bool {
        self.last_sample.is_some()
    }

    /// Forget all stroke state
    pub fn reset(&mut self) {
        self.last_sample = None;
        self.last_stamp = None;
        self.stamp_count = 0;
    }

    /// Feed the next sample and get the stamps due along the new segment.
    ///
    /// The first sample of a stroke always yields one stamp at its position.
    /// The returned iterator is lazy and advances the stroke state as it is
    /// consumed; it must be drained before the next `push`. Samples with a
    /// NaN or infinite position are dropped and yield no stamps.
    pub fn push(&mut self, sample: StrokeSample) -> SegmentStamps<'_> {
        let sample = StrokeSample::new(sample.position, sample.pressure);
        if !sample.is_finite() {
            warn!(
                "StrokeRasterizer::push: dropping non-finite sample at {:?}",
                sample.position
            );
            return SegmentStamps {
                rasterizer: self,
                from: sample,
                to: sample,
                t: 0.0,
                first: None,
                done: true,
            };
        }
        let previous = self.last_sample.replace(sample);

        let (from, first) = match previous {
            Some(prev) => (prev, None),
            None => {
                debug!(
                    "StrokeRasterizer::push: FIRST stamp at ({:.1}, {:.1})",
                    sample.position.x, sample.position.y
                );
                let first = StampPlacement {
                    position: sample.position,
                    pressure: sample.pressure,
                };
                (sample, Some(first))
            }
        };

        SegmentStamps {
            rasterizer: self,
            from,
            to: sample,
            t: 0.0,
            first,
            done: false,
        }
    }
}

/// Lazy stamp sequence along one input segment
#[derive(Debug)]
pub struct SegmentStamps<'a> {
    rasterizer: &'a mut StrokeRasterizer,
    from: StrokeSample,
    to: StrokeSample,
    /// Walk position along the segment, 0.0..=1.0
    t: f32,
    first: Option<StampPlacement>,
    done: bool,
}

impl SegmentStamps<'_> {
    fn emit(&mut self, stamp: StampPlacement) -> Option<StampPlacement> {
        self.rasterizer.last_stamp = Some(stamp.position);
        self.rasterizer.stamp_count += 1;
        Some(stamp)
    }
}

impl Iterator for SegmentStamps<'_> {
    type Item = StampPlacement;

    fn next(&mut self) -> Option<StampPlacement> {
        if let Some(first) = self.first.take() {
            return self.emit(first);
        }
        if self.done {
            return None;
        }

        let Some(last_stamp) = self.rasterizer.last_stamp else {
            self.done = true;
            return None;
        };

        let delta = self.to.position - self.from.position;
        let a = delta.length_squared();
        if a < 1e-12 || !a.is_finite() {
            // No significant movement, or a span too long to measure in f32
            self.done = true;
            return None;
        }

        // Solve |cur + u * delta - last_stamp| = spacing for the exit point u >= 0
        let spacing = self.rasterizer.spacing;
        let cur = self.from.position + delta * self.t;
        let f = cur - last_stamp;
        let b = 2.0 * f.dot(delta);
        let c = f.length_squared() - spacing * spacing;
        let u = if c >= 0.0 {
            0.0
        } else {
            let sqrt_disc = (b * b - 4.0 * a * c).max(0.0).sqrt();
            // Larger root, in the form that avoids cancellation
            if b >= 0.0 {
                (-2.0 * c) / (b + sqrt_disc)
            } else {
                (-b + sqrt_disc) / (2.0 * a)
            }
        };

        let t = self.t + u;
        if !t.is_finite() {
            self.done = true;
            return None;
        }
        // Allow rounding overshoot past the segment end of well under epsilon
        if (t - 1.0) * a.sqrt() > SPACING_EPSILON * 0.5 {
            self.done = true;
            return None;
        }
        let t = t.min(1.0);
        self.t = t;

        let position = self.from.position + delta * t;
        let pressure = self.from.pressure + (self.to.pressure - self.from.pressure) * t;
        self.emit(StampPlacement { position, pressure })
    }
}

/// Rasterize a whole sample sequence at once
pub fn rasterize_path(
    samples: impl IntoIterator<Item = StrokeSample>,
    spacing: f32,
) -> Vec<StampPlacement> {
    let mut rasterizer = StrokeRasterizer::new(spacing);
    let mut stamps = Vec::new();
    for sample in samples {
        stamps.extend(rasterizer.push(sample));
    }
    stamps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_min_spacing(stamps: &[StampPlacement], spacing: f32) {
        for pair in stamps.windows(2) {
            let d = pair[0].position.distance(pair[1].position);
            assert!(d >= spacing - SPACING_EPSILON, "stamps {:?} too close: {d}", pair);
        }
    }

    #[test]
    fn test_first_sample_emits_stamp() {
        let mut rasterizer = StrokeRasterizer::new(10.0);
        let stamps: Vec<_> = rasterizer.push(StrokeSample::at(100.0, 100.0)).collect();

        assert_eq!(stamps.len(), 1);
        assert!((stamps[0].position - Vec2::new(100.0, 100.0)).length() < 0.001);
        assert_eq!(rasterizer.stamp_count(), 1);
    }

    #[test]
    fn test_interpolation_along_segment() {
        // 50% of 20 px = 10 px spacing
        let brush = Brush::ROUND.with_size(20).with_spacing(0.5);
        let mut rasterizer = StrokeRasterizer::for_brush(&brush);

        assert_eq!(rasterizer.push(StrokeSample::at(0.0, 0.0)).count(), 1);

        // Move 50 pixels - 5 stamps at 10, 20, 30, 40, 50
        let stamps: Vec<_> = rasterizer.push(StrokeSample::at(50.0, 0.0)).collect();
        assert_eq!(stamps.len(), 5);
        for (i, stamp) in stamps.iter().enumerate() {
            assert!((stamp.position.x - 10.0 * (i + 1) as f32).abs() < 0.01);
        }
    }

    #[test]
    fn test_no_stamps_for_small_movement() {
        let mut rasterizer = StrokeRasterizer::new(10.0);
        rasterizer.push(StrokeSample::at(0.0, 0.0)).count();

        // Less than spacing distance - no new stamps
        assert_eq!(rasterizer.push(StrokeSample::at(5.0, 0.0)).count(), 0);
        // Accumulates across samples: 12 px from the first stamp now
        let stamps: Vec<_> = rasterizer.push(StrokeSample::at(12.0, 0.0)).collect();
        assert_eq!(stamps.len(), 1);
        assert!((stamps[0].position.x - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_single_point_stroke_emits_one_stamp() {
        let mut rasterizer = StrokeRasterizer::new(4.0);
        let p = StrokeSample::at(3.0, 7.0);
        let total: usize = (0..3).map(|_| rasterizer.push(p).count()).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_pressure_interpolated() {
        let mut rasterizer = StrokeRasterizer::new(5.0);
        rasterizer.push(StrokeSample::new(Vec2::ZERO, 0.0)).count();
        let end = StrokeSample::new(Vec2::new(10.0, 0.0), 1.0);
        let stamps: Vec<_> = rasterizer.push(end).collect();
        assert_eq!(stamps.len(), 2);
        assert!((stamps[0].pressure - 0.5).abs() < 0.01);
        assert!((stamps[1].pressure - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_reset_starts_new_stroke() {
        let mut rasterizer = StrokeRasterizer::new(10.0);
        rasterizer.push(StrokeSample::at(0.0, 0.0)).count();
        rasterizer.push(StrokeSample::at(50.0, 0.0)).count();
        rasterizer.reset();

        // After reset, next push should emit a first stamp again
        assert!(!rasterizer.is_started());
        assert_eq!(rasterizer.push(StrokeSample::at(100.0, 100.0)).count(), 1);
    }

    #[test]
    fn test_min_spacing_on_zigzag_paths() {
        let paths: Vec<Vec<StrokeSample>> = vec![
            // Sharp reversal
            vec![
                StrokeSample::at(0.0, 0.0),
                StrokeSample::at(7.0, 0.0),
                StrokeSample::at(1.0, 0.5),
            ],
            // Zigzag
            (0..40)
                .map(|i| StrokeSample::at(i as f32 * 1.7, if i % 2 == 0 { 0.0 } else { 6.3 }))
                .collect(),
            // Spiral
            (0..200)
                .map(|i| {
                    let a = i as f32 * 0.2;
                    StrokeSample::at(50.0 + a.cos() * a, 50.0 + a.sin() * a)
                })
                .collect(),
        ];
        for spacing in [1.0, 2.5, 4.0, 9.0] {
            for path in &paths {
                let stamps = rasterize_path(path.iter().copied(), spacing);
                assert!(!stamps.is_empty());
                assert_min_spacing(&stamps, spacing);
            }
        }
    }

    #[test]
    fn test_no_gaps_on_fast_stroke() {
        let path = [StrokeSample::at(0.0, 0.0), StrokeSample::at(100.0, 100.0)];
        let stamps = rasterize_path(path, 3.0);
        for pair in stamps.windows(2) {
            let d = pair[0].position.distance(pair[1].position);
            assert!(d <= 3.0 + SPACING_EPSILON);
        }
        assert!(stamps.len() >= 47);
    }

    #[test]
    fn test_partially_consumed_segment_keeps_spacing() {
        let mut rasterizer = StrokeRasterizer::new(5.0);
        let mut stamps: Vec<_> = rasterizer.push(StrokeSample::at(0.0, 0.0)).collect();
        stamps.extend(rasterizer.push(StrokeSample::at(30.0, 0.0)).take(2));
        stamps.extend(rasterizer.push(StrokeSample::at(30.0, 30.0)));
        assert_min_spacing(&stamps, 5.0);
    }

    #[test]
    fn test_non_finite_sample_emits_nothing() {
        let mut rasterizer = StrokeRasterizer::new(2.0);
        assert_eq!(rasterizer.push(StrokeSample::at(f32::NAN, 0.0)).take(1000).count(), 0);
        assert!(!rasterizer.is_started());

        rasterizer.push(StrokeSample::at(1.0, 1.0)).count();
        for bad in [
            StrokeSample::at(f32::NAN, 5.0),
            StrokeSample::at(f32::INFINITY, 1.0),
            StrokeSample::at(1.0, f32::NEG_INFINITY),
        ] {
            assert_eq!(rasterizer.push(bad).take(1000).count(), 0);
        }

        // The stroke resumes from the last finite sample
        let stamps: Vec<_> = rasterizer.push(StrokeSample::at(5.0, 1.0)).take(1000).collect();
        assert_eq!(stamps.len(), 2);
        assert!(stamps.iter().all(|s| s.position.is_finite()));
    }

    #[test]
    fn test_huge_span_terminates() {
        let stamps: Vec<_> = [StrokeSample::at(-3.0e38, 0.0), StrokeSample::at(3.0e38, 0.0)]
            .into_iter()
            .flat_map(|sample| {
                let mut rasterizer = StrokeRasterizer::new(1.0);
                rasterizer.push(StrokeSample::at(0.0, 0.0)).count();
                rasterizer.push(sample).take(10).collect::<Vec<_>>()
            })
            .collect();
        assert!(stamps.iter().all(|s| s.position.is_finite()));
    }

    #[test]
    fn test_nan_pressure_reads_as_zero() {
        let sample = StrokeSample::new(Vec2::ZERO, f32::NAN);
        assert_eq!(sample.pressure, 0.0);
        assert_eq!(StrokeSample::new(Vec2::ZERO, f32::INFINITY).pressure, 1.0);
    }

    #[test]
    fn test_spacing_floor() {
        assert_eq!(StrokeRasterizer::new(0.0).spacing(), 1.0);
        assert_eq!(StrokeRasterizer::new(f32::NAN).spacing(), 1.0);
    }
}
