// ============================================================================
// EDIT SESSION: active image plus bounded undo/redo snapshot stacks
// ============================================================================
//
// The session owns every buffer it holds. A buffer lives in exactly one place
// at a time: the active slot, the undo stack, or the redo stack. Moving
// between them is a move, and eviction or clearing drops the buffer.
// ============================================================================

use std::collections::VecDeque;

use crate::buffer::PixelBuffer;
use crate::error::Result;
use crate::ops::{EngineConfig, Transform, TransformRun};

/// Default undo depth.
pub const MAX_HISTORY: usize = 15;

const LOAD_LABEL: &str = "Load";
const EDIT_LABEL: &str = "Edit";

/// A snapshot and the action that produced it.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    label: String,
    buffer: PixelBuffer,
}

impl HistoryEntry {
    fn new(buffer: PixelBuffer, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            buffer,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing loaded yet (or the session was closed).
    Empty,
    /// An active image exists.
    Active,
}

/// Undo/redo history for one edited image.
#[derive(Debug)]
pub struct EditSession {
    active: Option<HistoryEntry>,
    /// Oldest at the front.
    undo_stack: VecDeque<HistoryEntry>,
    /// Oldest at the front; the next redo is at the back.
    redo_stack: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditSession {
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }

    /// Session keeping at most `capacity` undo snapshots (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            active: None,
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    // ------------------------------------------------------------------
    // State transitions
    // ------------------------------------------------------------------

    /// Replace everything with a freshly loaded image. Valid in any state.
    pub fn load(&mut self, buffer: PixelBuffer) -> &PixelBuffer {
        if self.active.is_some() {
            log::debug!(
                "load discards active image and {} undo / {} redo snapshot(s)",
                self.undo_stack.len(),
                self.redo_stack.len()
            );
        }
        self.undo_stack.clear();
        self.redo_stack.clear();
        &self.active.insert(HistoryEntry::new(buffer, LOAD_LABEL)).buffer
    }

    /// Install `buffer` as the new active image. See [`EditSession::apply_labeled`].
    pub fn apply(&mut self, buffer: PixelBuffer) -> Option<&PixelBuffer> {
        self.apply_labeled(buffer, EDIT_LABEL)
    }

    /// Push the current image onto the undo stack, drop all redo snapshots,
    /// and make `buffer` active. Evicts the oldest undo snapshot when over
    /// capacity.
    ///
    /// Rejected (returns `None`, `buffer` is dropped) when nothing is loaded.
    pub fn apply_labeled(&mut self, buffer: PixelBuffer, label: impl Into<String>) -> Option<&PixelBuffer> {
        let Some(previous) = self.active.take() else {
            log::warn!("apply ignored: no active image");
            return None;
        };
        self.undo_stack.push_back(previous);
        if !self.redo_stack.is_empty() {
            log::debug!("new edit discards {} redo snapshot(s)", self.redo_stack.len());
            self.redo_stack.clear();
        }
        self.prune();
        Some(&self.active.insert(HistoryEntry::new(buffer, label)).buffer)
    }

    /// Run `transform` on the active image and apply the result.
    ///
    /// Returns `Ok(None)` without running anything when nothing is loaded.
    pub fn apply_transform(&mut self, transform: Transform, config: &EngineConfig) -> Result<Option<TransformRun>> {
        let Some(src) = self.active() else {
            log::warn!("{} ignored: no active image", transform.name());
            return Ok(None);
        };
        let (out, run) = transform.apply_timed(src, config)?;
        self.apply_labeled(out, transform.label());
        Ok(Some(run))
    }

    /// Step back one snapshot. `None` (and no change) when the undo stack is empty.
    pub fn undo(&mut self) -> Option<&PixelBuffer> {
        let Some(previous) = self.undo_stack.pop_back() else {
            log::warn!("undo ignored: nothing to undo");
            return None;
        };
        if let Some(current) = self.active.replace(previous) {
            self.redo_stack.push_back(current);
        }
        self.active()
    }

    /// Step forward one snapshot. `None` (and no change) when the redo stack is empty.
    pub fn redo(&mut self) -> Option<&PixelBuffer> {
        let Some(next) = self.redo_stack.pop_back() else {
            log::warn!("redo ignored: nothing to redo");
            return None;
        };
        if let Some(current) = self.active.replace(next) {
            self.undo_stack.push_back(current);
        }
        debug_assert!(self.undo_stack.len() <= self.capacity);
        self.active()
    }

    /// Undo up to `steps` times, stopping early when the stack runs out.
    /// Returns how many steps were taken.
    pub fn undo_to(&mut self, steps: usize) -> usize {
        let mut taken = 0;
        while taken < steps && self.can_undo() {
            self.undo();
            taken += 1;
        }
        taken
    }

    /// Drop both stacks, keeping the active image.
    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Return to `Empty`, handing back the active image if there was one.
    pub fn close(&mut self) -> Option<PixelBuffer> {
        self.clear_history();
        self.active.take().map(|entry| entry.buffer)
    }

    /// Evict the oldest undo snapshots beyond capacity.
    fn prune(&mut self) {
        while self.undo_stack.len() > self.capacity {
            if let Some(evicted) = self.undo_stack.pop_front() {
                log::debug!(
                    "history full ({}): evicting oldest snapshot '{}'",
                    self.capacity,
                    evicted.label
                );
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        if self.active.is_some() {
            SessionState::Active
        } else {
            SessionState::Empty
        }
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_none()
    }

    pub fn active(&self) -> Option<&PixelBuffer> {
        self.active.as_ref().map(|e| &e.buffer)
    }

    /// Label of the action that produced the active image.
    pub fn active_label(&self) -> Option<&str> {
        self.active.as_ref().map(|e| e.label())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot the next undo would restore.
    pub fn undo_peek(&self) -> Option<&PixelBuffer> {
        self.undo_stack.back().map(|e| &e.buffer)
    }

    /// Snapshot the next redo would restore.
    pub fn redo_peek(&self) -> Option<&PixelBuffer> {
        self.redo_stack.back().map(|e| &e.buffer)
    }

    /// The edit an undo would revert.
    pub fn undo_description(&self) -> Option<&str> {
        if self.can_undo() { self.active_label() } else { None }
    }

    /// The edit a redo would reapply.
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|e| e.label())
    }

    /// Labels of the undo snapshots, most recent first.
    pub fn undo_history(&self) -> Vec<&str> {
        self.undo_stack.iter().rev().map(|e| e.label()).collect()
    }

    /// Bytes held by the active image and both stacks.
    pub fn memory_usage(&self) -> usize {
        self.active
            .iter()
            .chain(&self.undo_stack)
            .chain(&self.redo_stack)
            .map(|e| e.buffer.byte_size())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(v: u8) -> PixelBuffer {
        PixelBuffer::filled(2, 2, [v, v, v, 255]).unwrap()
    }

    #[test]
    fn capacity_is_at_least_one() {
        assert_eq!(EditSession::with_capacity(0).capacity(), 1);
        assert_eq!(EditSession::new().capacity(), MAX_HISTORY);
    }

    #[test]
    fn descriptions_follow_labels() {
        let mut session = EditSession::new();
        session.load(solid(0));
        assert_eq!(session.undo_description(), None);

        session.apply_labeled(solid(1), "Negate");
        session.apply_labeled(solid(2), "Gamma");
        assert_eq!(session.undo_description(), Some("Gamma"));
        assert_eq!(session.undo_history(), vec!["Negate", "Load"]);

        session.undo();
        assert_eq!(session.redo_description(), Some("Gamma"));
        assert_eq!(session.undo_description(), Some("Negate"));
    }

    #[test]
    fn memory_usage_counts_every_snapshot() {
        let mut session = EditSession::new();
        assert_eq!(session.memory_usage(), 0);
        session.load(solid(0));
        session.apply(solid(1));
        session.apply(solid(2));
        session.undo();
        // active + one undo + one redo, 16 bytes each
        assert_eq!(session.memory_usage(), 48);
    }

    #[test]
    fn close_returns_active_image() {
        let mut session = EditSession::new();
        session.load(solid(9));
        session.apply(solid(10));
        let img = session.close().unwrap();
        assert_eq!(img.pixel(0, 0), [10, 10, 10, 255]);
        assert_eq!(session.state(), SessionState::Empty);
        assert!(!session.can_undo());
    }
}
