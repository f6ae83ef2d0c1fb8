//! Bounded undo/redo history of snapshots.
//!
//! Unlike a command stack, every entry is a full snapshot. The cursor always
//! points at the entry matching the live state.

use std::collections::VecDeque;

use tracing::{debug, trace};

/// Snapshot history with a cursor and a fixed capacity.
#[derive(Debug, Clone)]
pub struct History<S> {
    entries: VecDeque<S>,
    cursor: usize,
    capacity: usize,
}

impl<S: Clone> History<S> {
    /// Start a history whose only entry is `initial`.
    pub fn new(initial: S, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut entries = VecDeque::with_capacity(capacity.min(16));
        entries.push_back(initial);
        Self {
            entries,
            cursor: 0,
            capacity,
        }
    }

    /// Record a new state. Anything that could have been redone is dropped
    /// and the oldest entry is evicted once over capacity.
    pub fn push(&mut self, state: S) {
        let discarded = self.entries.len() - (self.cursor + 1);
        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(state);
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
            debug!(capacity = self.capacity, "evicted oldest history entry");
        }
        self.cursor = self.entries.len() - 1;
        trace!(cursor = self.cursor, discarded, "pushed history entry");
    }

    /// Step back. `None` when already at the oldest entry.
    pub fn undo(&mut self) -> Option<&S> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        trace!(cursor = self.cursor, "undo");
        self.entries.get(self.cursor)
    }

    /// Step forward. `None` when already at the newest entry.
    pub fn redo(&mut self) -> Option<&S> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        trace!(cursor = self.cursor, "redo");
        self.entries.get(self.cursor)
    }

    /// The entry the cursor points at.
    pub fn current(&self) -> Option<&S> {
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forget everything except the current entry.
    pub fn reset(&mut self) {
        if let Some(current) = self.entries.get(self.cursor).cloned() {
            self.entries.clear();
            self.entries.push_back(current);
        }
        self.cursor = 0;
    }
}
