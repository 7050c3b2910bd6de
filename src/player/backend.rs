//! External player process interface.
//!
//! The queue and controller never decode audio themselves. Each player handle
//! owns one [`PlaybackBackend`], which fronts an external process (see
//! [`super::mpv`]). Tests substitute a scripted implementation.
//!
//! # Example
//!
//! ```ignore
//! let factory = MpvFactory::new(config.player.clone());
//! let handle = PlayerHandle::new(episode, factory.create(), 100);
//! ```

use std::time::Duration;

use super::PlayerError;
use super::state::{BackendSnapshot, SeekDelta};

/// One external playback session.
///
/// `load` starts playback of a locator from the beginning. `stop` must
/// release every process resource before it returns and reset the snapshot,
/// so a stopped backend never reports completion.
pub trait PlaybackBackend: Send {
    /// Start playing `locator` from the beginning.
    fn load(&mut self, locator: &str) -> Result<(), PlayerError>;

    /// Resume after a pause.
    fn play(&mut self) -> Result<(), PlayerError>;

    /// Pause without releasing the process.
    fn pause(&mut self) -> Result<(), PlayerError>;

    /// Terminate playback and release the process.
    fn stop(&mut self);

    /// Relative seek.
    fn seek(&mut self, delta: SeekDelta) -> Result<(), PlayerError>;

    /// Volume in percent (0 - 100).
    fn set_volume(&mut self, percent: u8) -> Result<(), PlayerError>;

    /// Playback speed multiplier.
    fn set_rate(&mut self, rate: f32) -> Result<(), PlayerError>;

    /// Last known state. Must not block on the external process.
    fn snapshot(&self) -> BackendSnapshot;

    /// Last known position.
    fn position(&self) -> Duration {
        self.snapshot().position
    }

    /// Whether the media reached its natural end.
    fn completion_signal(&self) -> bool {
        self.snapshot().finished
    }
}

/// Creates a fresh backend for every new player handle.
pub trait BackendFactory {
    fn create(&self) -> Box<dyn PlaybackBackend>;
}
