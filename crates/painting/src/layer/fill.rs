//! Bucket fill

use std::collections::VecDeque;

use glam::IVec2;
use tracing::debug;

use super::DrawLayer;
use crate::error::PaintResult;
use crate::types::Color;

impl DrawLayer {
    /// 4-connected flood fill from `seed`.
    ///
    /// Pixels whose largest per-channel difference from the seed color is at
    /// most `tolerance` are replaced by `color`. Queue based, so large regions
    /// cannot overflow the stack. Returns the number of pixels recolored; a
    /// seed outside the layer, or a seed already equal to `color`, fills nothing.
    pub fn flood_fill(&mut self, seed: IVec2, color: Color, tolerance: u8) -> PaintResult<usize> {
        self.ensure_unlocked()?;

        if !self.buffer.contains(seed.x, seed.y) {
            return Ok(0);
        }
        let target = self.buffer.get(seed.x, seed.y);
        if target == color {
            return Ok(0);
        }

        let width = self.buffer.width() as i32;
        let height = self.buffer.height() as i32;
        let mut visited = vec![false; self.buffer.pixel_count()];
        let mut queue = VecDeque::new();
        let mut filled = 0usize;

        let index = |p: IVec2| (p.y * width + p.x) as usize;
        visited[index(seed)] = true;
        queue.push_back(seed);

        while let Some(p) = queue.pop_front() {
            self.buffer.set(p.x, p.y, color);
            filled += 1;

            for n in [p + IVec2::X, p - IVec2::X, p + IVec2::Y, p - IVec2::Y] {
                if n.x < 0 || n.y < 0 || n.x >= width || n.y >= height {
                    continue;
                }
                let i = index(n);
                if visited[i] {
                    continue;
                }
                if self.buffer.get(n.x, n.y).max_channel_diff(target) <= tolerance {
                    visited[i] = true;
                    queue.push_back(n);
                }
            }
        }

        debug!(
            "DrawLayer::flood_fill: layer {} seed=({}, {}) tolerance={} -> {} pixels",
            self.id, seed.x, seed.y, tolerance, filled
        );
        Ok(filled)
    }
}
