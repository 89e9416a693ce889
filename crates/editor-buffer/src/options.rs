//! Document tuning knobs.

use crate::storage::{DEFAULT_INITIAL_GAP, DEFAULT_MIN_CAPACITY};
use crate::syntax::DEFAULT_MAX_STALE_SEGMENTS;

/// Default depth cap of [`UndoHistory`](crate::UndoHistory).
pub const DEFAULT_UNDO_LIMIT: usize = 1000;

/// Options used when creating a [`Document`](crate::Document).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentOptions {
    /// Gap reserved when the buffer is created.
    pub initial_gap: usize,
    /// Floor of the buffer growth formula.
    pub min_capacity: usize,
    /// Early-exit candidate segments the syntax cache keeps after edits.
    pub max_stale_segments: usize,
    /// Depth cap for an undo history created with [`UndoHistory::for_options`](crate::UndoHistory::for_options).
    pub undo_limit: usize,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            initial_gap: DEFAULT_INITIAL_GAP,
            min_capacity: DEFAULT_MIN_CAPACITY,
            max_stale_segments: DEFAULT_MAX_STALE_SEGMENTS,
            undo_limit: DEFAULT_UNDO_LIMIT,
        }
    }
}

impl DocumentOptions {
    /// Set the initial gap.
    pub fn with_initial_gap(mut self, initial_gap: usize) -> Self {
        self.initial_gap = initial_gap;
        self
    }

    /// Set the minimum capacity.
    pub fn with_min_capacity(mut self, min_capacity: usize) -> Self {
        self.min_capacity = min_capacity;
        self
    }

    /// Set how many stale segments the syntax cache keeps.
    pub fn with_max_stale_segments(mut self, max_stale_segments: usize) -> Self {
        self.max_stale_segments = max_stale_segments;
        self
    }

    /// Set the undo depth cap.
    pub fn with_undo_limit(mut self, undo_limit: usize) -> Self {
        self.undo_limit = undo_limit;
        self
    }
}
