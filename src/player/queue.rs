//! Play queue management.
//!
//! The queue exclusively owns its [`PlayerHandle`]s in play order. The head
//! is the current entry. Outside code refers to entries by [`HandleId`].
//!
//! Invariants held after every public call:
//! - at most one entry is playing
//! - no two entries share an id
//! - `first()` is `None` iff the queue is empty
//! - an entry is stopped before it leaves the queue

use super::PlayerError;
use super::handle::{HandleId, PlayerHandle};

/// Programmer-misuse conditions. Routine absence is not an error.
///
/// Duplicates need no variant: handles are moved into the queue and ids are
/// never reused, so the same handle cannot be queued twice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("player {0} is not queued")]
    NotQueued(HandleId),
}

/// The play queue.
#[derive(Debug, Default)]
pub struct PlaybackQueue {
    entries: Vec<PlayerHandle>,
}

impl PlaybackQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if queue is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get queue length.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The head entry.
    pub fn first(&self) -> Option<&PlayerHandle> {
        self.entries.first()
    }

    pub fn first_mut(&mut self) -> Option<&mut PlayerHandle> {
        self.entries.first_mut()
    }

    /// Entries in play order.
    pub fn iter(&self) -> impl Iterator<Item = &PlayerHandle> {
        self.entries.iter()
    }

    pub fn get(&self, id: HandleId) -> Option<&PlayerHandle> {
        self.entries.iter().find(|h| h.id() == id)
    }

    pub fn get_mut(&mut self, id: HandleId) -> Option<&mut PlayerHandle> {
        self.entries.iter_mut().find(|h| h.id() == id)
    }

    pub fn contains(&self, id: HandleId) -> bool {
        self.position_of(id).is_some()
    }

    /// Index of an entry, 0 being the head.
    pub fn position_of(&self, id: HandleId) -> Option<usize> {
        self.entries.iter().position(|h| h.id() == id)
    }

    /// Append to the tail. The new entry is not started, even when it
    /// becomes the head of an empty queue.
    pub fn add(&mut self, handle: PlayerHandle) -> HandleId {
        let id = handle.id();
        tracing::debug!(target: "player::queue", %id, title = handle.title(), "queued");
        self.entries.push(handle);
        id
    }

    /// Remove an entry wherever it sits, stopping it first.
    ///
    /// Returns `false` when the id is not queued.
    pub fn remove(&mut self, id: HandleId) -> bool {
        let Some(index) = self.position_of(id) else {
            return false;
        };
        let mut handle = self.entries.remove(index);
        handle.stop();
        tracing::debug!(target: "player::queue", %id, index, "removed");
        true
    }

    /// Stop and remove the head. The next entry, if any, becomes the head
    /// but is not started.
    pub fn remove_current_and_advance(&mut self) -> Option<PlayerHandle> {
        if self.entries.is_empty() {
            return None;
        }
        let mut handle = self.entries.remove(0);
        handle.stop();
        tracing::debug!(
            target: "player::queue",
            id = %handle.id(),
            next = ?self.entries.first().map(|h| h.id()),
            "advanced"
        );
        Some(handle)
    }

    /// Stop the head and empty the queue.
    pub fn clear(&mut self) {
        if let Some(head) = self.entries.first_mut() {
            head.stop();
        }
        // Remaining entries are stopped as they drop
        self.entries.clear();
    }

    /// Move an entry to the head, keeping the relative order of the rest.
    ///
    /// Whatever was playing is paused so the promoted entry can take over.
    pub fn promote(&mut self, id: HandleId) -> Result<(), QueueError> {
        let index = self.position_of(id).ok_or(QueueError::NotQueued(id))?;
        self.pause_all_except(id);
        if index > 0 {
            let handle = self.entries.remove(index);
            self.entries.insert(0, handle);
        }
        Ok(())
    }

    /// Play an entry, pausing any other playing entry first.
    pub fn play_exclusive(&mut self, id: HandleId) -> Result<(), PlayerError> {
        self.pause_all_except(id);
        match self.get_mut(id) {
            Some(handle) => handle.play(),
            None => Ok(()),
        }
    }

    fn pause_all_except(&mut self, id: HandleId) {
        for handle in self.entries.iter_mut().filter(|h| h.id() != id && h.is_playing()) {
            if let Err(e) = handle.pause() {
                tracing::warn!(target: "player::queue", id = %handle.id(), error = %e, "failed to pause");
            }
        }
    }

    /// Move an entry up one position. Returns the new index if moved.
    pub fn move_up(&mut self, id: HandleId) -> Option<usize> {
        let index = self.position_of(id)?;
        if index == 0 {
            return None; // Already at top
        }
        self.entries.swap(index, index - 1);
        Some(index - 1)
    }

    /// Move an entry down one position. Returns the new index if moved.
    pub fn move_down(&mut self, id: HandleId) -> Option<usize> {
        let index = self.position_of(id)?;
        if index + 1 >= self.entries.len() {
            return None; // Already at bottom
        }
        self.entries.swap(index, index + 1);
        Some(index + 1)
    }

    /// Refresh every entry from its backend, returning entries whose player
    /// died.
    pub fn refresh(&mut self) -> Vec<(HandleId, PlayerError)> {
        self.entries
            .iter_mut()
            .filter_map(|h| h.refresh().err().map(|e| (h.id(), e)))
            .collect()
    }

    /// Whether the head finished on its own since the last call.
    ///
    /// Completions raised by other entries are discarded; only the head
    /// auto-advances.
    pub fn take_head_completion(&mut self) -> bool {
        let mut entries = self.entries.iter_mut();
        let head = entries.next().is_some_and(|h| h.take_completion());
        for handle in entries {
            handle.take_completion();
        }
        head
    }
}

impl Drop for PlaybackQueue {
    fn drop(&mut self) {
        self.clear();
    }
}
