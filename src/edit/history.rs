use crate::scene::layer::Layer;

/// Linear undo/redo log of full layer-stack snapshots plus the live stack.
///
/// `entries[index]` is always the last committed state. The live stack may diverge from it
/// while a gesture previews geometry (`commit(.., false)`); a final commit either appends one
/// entry or, when nothing changed since `begin_interaction`, is dropped.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Vec<Layer>>,
    index: usize,
    live: Vec<Layer>,
    pending: Option<Vec<Layer>>,
    limit: Option<usize>,
}

impl History {
    /// Start a log whose only entry is `initial`. `limit` caps retained snapshots.
    pub fn new(initial: Vec<Layer>, limit: Option<usize>) -> Self {
        Self {
            entries: vec![initial.clone()],
            index: 0,
            live: initial,
            pending: None,
            limit: limit.map(|n| n.max(1)),
        }
    }

    /// Currently displayed layers.
    pub fn current(&self) -> &[Layer] {
        &self.live
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn is_interacting(&self) -> bool {
        self.pending.is_some()
    }

    /// Snapshot the live stack as the comparison base for the next final commit.
    pub fn begin_interaction(&mut self) {
        self.pending = Some(self.live.clone());
    }

    /// Replace the live stack; when `is_final`, record it if it differs from the start state.
    ///
    /// Returns `true` when a new history entry was appended.
    pub fn commit(&mut self, layers: Vec<Layer>, is_final: bool) -> bool {
        self.live = layers;
        if !is_final {
            return false;
        }

        let changed = match self.pending.take() {
            Some(start) => start != self.live,
            None => self.entries[self.index] != self.live,
        };
        if !changed {
            tracing::debug!(index = self.index, "history commit dropped (no change)");
            return false;
        }

        self.entries.truncate(self.index + 1);
        self.entries.push(self.live.clone());
        self.index += 1;

        if let Some(limit) = self.limit {
            let excess = self.entries.len().saturating_sub(limit);
            if excess > 0 {
                self.entries.drain(..excess);
                self.index -= excess;
            }
        }

        debug_assert!(self.index < self.entries.len());
        tracing::debug!(index = self.index, len = self.entries.len(), "history commit");
        true
    }

    /// Abandon a pending interaction and restore the last committed state.
    pub fn rollback(&mut self) {
        self.pending = None;
        self.live = self.entries[self.index].clone();
    }

    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.index -= 1;
        self.restore_cursor();
        tracing::debug!(index = self.index, "undo");
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.index += 1;
        self.restore_cursor();
        tracing::debug!(index = self.index, "redo");
        true
    }

    /// Discard the whole log and start over from `layers`.
    pub fn reset(&mut self, layers: Vec<Layer>) {
        self.entries = vec![layers.clone()];
        self.index = 0;
        self.live = layers;
        self.pending = None;
    }

    fn restore_cursor(&mut self) {
        self.pending = None;
        self.live = self.entries[self.index].clone();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/edit/history.rs"]
mod tests;
