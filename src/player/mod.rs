//! Playback core: player handles, their external backends, and the queue.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  PlaybackQueue (UI thread)                      │
//! │      Ordered PlayerHandles, head = current, one playing         │
//! └────────────────────────────┬────────────────────────────────────┘
//!                              │ owns
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       PlayerHandle                              │
//! │   Stopped / Playing / Paused, last known position, completion   │
//! └────────────────────────────┬────────────────────────────────────┘
//!                              │ Box<dyn PlaybackBackend>
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 External player process (mpv)                   │
//! │           Decodes and outputs audio, reports via IPC            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod backend;
mod handle;
#[cfg(unix)]
mod mpv;
mod queue;
mod state;

pub use backend::{BackendFactory, PlaybackBackend};
pub use handle::{HandleId, MAX_RATE, MIN_RATE, PlayerHandle};
#[cfg(unix)]
pub use mpv::{MpvBackend, MpvFactory};
pub use queue::{PlaybackQueue, QueueError};
pub use state::{BackendSnapshot, PlaybackStatus, SeekDelta, format_duration};

/// Player errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlayerError {
    #[error("Failed to start player: {0}")]
    Spawn(String),

    #[error("Player IPC failed: {0}")]
    Ipc(String),

    #[error("Player process exited unexpectedly")]
    ProcessExited,

    #[error("No media loaded")]
    NotLoaded,
}
