//! Undo/redo history of whole-layer snapshots

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::manager::LayerManager;
use crate::surface::PixelBuffer;
use crate::types::LayerId;

/// Layer contents captured before (or, on the redo stack, after) an edit
#[derive(Debug, Clone)]
pub struct UndoEntry {
    pub layer: LayerId,
    pub buffer: PixelBuffer,
}

/// Bounded undo and redo stacks
#[derive(Debug, Clone)]
pub struct History {
    /// Most recent at the back
    undo: VecDeque<UndoEntry>,
    redo: Vec<UndoEntry>,
    max_levels: usize,
}

impl History {
    pub fn new(max_levels: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_levels,
        }
    }

    /// Record the state of `layer` before an edit and forget redoable steps
    pub fn record(&mut self, layer: LayerId, before: PixelBuffer) {
        self.redo.clear();
        if self.max_levels == 0 {
            return;
        }
        while self.undo.len() >= self.max_levels {
            self.undo.pop_front();
        }
        self.undo.push_back(UndoEntry { layer, buffer: before });
        debug!("History: recorded {} ({} levels)", layer, self.undo.len());
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of undo levels available
    pub fn undo_count(&self) -> usize {
        self.undo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Restore the most recent snapshot.
    ///
    /// Entries for layers that no longer exist are dropped with a warning.
    /// Returns true if a layer was restored.
    pub fn undo(&mut self, layers: &mut LayerManager) -> bool {
        while let Some(entry) = self.undo.pop_back() {
            if let Some(current) = swap_into(layers, entry) {
                self.redo.push(current);
                return true;
            }
        }
        debug!("History::undo: no entries available");
        false
    }

    /// Re-apply the most recently undone edit
    pub fn redo(&mut self, layers: &mut LayerManager) -> bool {
        while let Some(entry) = self.redo.pop() {
            if let Some(current) = swap_into(layers, entry) {
                self.undo.push_back(current);
                return true;
            }
        }
        debug!("History::redo: no entries available");
        false
    }
}

/// Put `entry`'s buffer back into its layer, returning what it replaced
fn swap_into(layers: &mut LayerManager, entry: UndoEntry) -> Option<UndoEntry> {
    match layers.layer_mut(entry.layer) {
        Ok(layer) => {
            let previous = layer.replace_buffer(entry.buffer);
            debug!("History: restored layer {}", entry.layer);
            Some(UndoEntry {
                layer: entry.layer,
                buffer: previous,
            })
        }
        Err(_) => {
            warn!("History: layer {} no longer exists, skipping", entry.layer);
            None
        }
    }
}
