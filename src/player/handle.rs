//! Player handle: one episode's playback session.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::PlayerError;
use super::backend::PlaybackBackend;
use super::state::{PlaybackStatus, SeekDelta};
use crate::model::Episode;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Lowest and highest playback rate accepted by [`PlayerHandle::set_rate`].
pub const MIN_RATE: f32 = 0.5;
pub const MAX_RATE: f32 = 2.0;

/// Identity of a player handle, unique for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl HandleId {
    fn next() -> Self {
        Self(NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A playable episode and the state of its external player.
///
/// The handle keeps last-known position and duration locally so UI queries
/// never reach the backend. [`refresh`](Self::refresh) pulls the backend's
/// latest snapshot and is where natural completion is latched.
pub struct PlayerHandle {
    id: HandleId,
    title: String,
    locator: String,
    episode: Arc<Episode>,
    status: PlaybackStatus,
    position: Duration,
    duration: Option<Duration>,
    volume: u8,
    rate: f32,
    completed: bool,
    backend: Box<dyn PlaybackBackend>,
}

impl PlayerHandle {
    /// Create a stopped handle for `episode`.
    pub fn new(episode: Arc<Episode>, backend: Box<dyn PlaybackBackend>, volume: u8) -> Self {
        Self {
            id: HandleId::next(),
            title: episode.display_title().to_string(),
            locator: episode.media_locator(),
            episode,
            status: PlaybackStatus::Stopped,
            position: Duration::ZERO,
            duration: None,
            volume: volume.min(100),
            rate: 1.0,
            completed: false,
            backend,
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn episode(&self) -> &Episode {
        &self.episode
    }

    pub fn state(&self) -> PlaybackStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Start or resume playback. Idempotent while playing.
    ///
    /// On failure the backend is released and the handle is left stopped.
    pub fn play(&mut self) -> Result<(), PlayerError> {
        let result = match self.status {
            PlaybackStatus::Playing => return Ok(()),
            PlaybackStatus::Stopped => self.start(),
            PlaybackStatus::Paused => self.backend.play(),
        };

        match result {
            Ok(()) => {
                tracing::debug!(target: "player::handle", id = %self.id, title = %self.title, "playing");
                self.status = PlaybackStatus::Playing;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(target: "player::handle", id = %self.id, error = %e, "failed to start playback");
                self.stop();
                Err(e)
            }
        }
    }

    fn start(&mut self) -> Result<(), PlayerError> {
        self.completed = false;
        self.position = Duration::ZERO;
        self.backend.load(&self.locator)?;
        if self.volume != 100 {
            self.backend.set_volume(self.volume)?;
        }
        if self.rate != 1.0 {
            self.backend.set_rate(self.rate)?;
        }
        Ok(())
    }

    /// Pause playback. No-op unless playing.
    pub fn pause(&mut self) -> Result<(), PlayerError> {
        if self.status != PlaybackStatus::Playing {
            return Ok(());
        }
        if let Err(e) = self.backend.pause() {
            self.stop();
            return Err(e);
        }
        self.status = PlaybackStatus::Paused;
        Ok(())
    }

    /// Pause if playing, otherwise play.
    pub fn toggle(&mut self) -> Result<(), PlayerError> {
        match self.status {
            PlaybackStatus::Playing => self.pause(),
            PlaybackStatus::Paused | PlaybackStatus::Stopped => self.play(),
        }
    }

    /// Stop playback and release the external process.
    ///
    /// A stop issued by the user discards any completion not yet taken.
    pub fn stop(&mut self) {
        self.backend.stop();
        self.status = PlaybackStatus::Stopped;
        self.position = Duration::ZERO;
        self.completed = false;
    }

    /// Relative seek, clamped to the known duration. No-op while stopped.
    pub fn seek(&mut self, delta: SeekDelta) -> Result<(), PlayerError> {
        if self.status == PlaybackStatus::Stopped {
            return Ok(());
        }
        self.backend.seek(delta)?;
        self.position = delta.apply(self.position, self.duration);
        Ok(())
    }

    /// Set volume in percent, clamped to 0 - 100.
    pub fn set_volume(&mut self, percent: u8) -> Result<(), PlayerError> {
        self.volume = percent.min(100);
        if self.status != PlaybackStatus::Stopped {
            self.backend.set_volume(self.volume)?;
        }
        Ok(())
    }

    /// Set playback rate, clamped to [`MIN_RATE`, `MAX_RATE`].
    pub fn set_rate(&mut self, rate: f32) -> Result<(), PlayerError> {
        self.rate = rate.clamp(MIN_RATE, MAX_RATE);
        if self.status != PlaybackStatus::Stopped {
            self.backend.set_rate(self.rate)?;
        }
        Ok(())
    }

    /// Pull the backend's latest state into the handle.
    ///
    /// Natural end of media moves the handle to stopped and raises the
    /// completion flag once. A backend that died unexpectedly also stops the
    /// handle and is reported as an error.
    pub fn refresh(&mut self) -> Result<(), PlayerError> {
        if self.status == PlaybackStatus::Stopped {
            return Ok(());
        }

        let snap = self.backend.snapshot();
        self.position = snap.position;
        if snap.duration.is_some() {
            self.duration = snap.duration;
        }

        if snap.finished {
            tracing::info!(target: "player::handle", id = %self.id, title = %self.title, "playback completed");
            self.backend.stop();
            self.status = PlaybackStatus::Stopped;
            self.completed = true;
        } else if snap.failed {
            self.stop();
            return Err(PlayerError::ProcessExited);
        }
        Ok(())
    }

    /// Return and clear the completion flag.
    pub fn take_completion(&mut self) -> bool {
        std::mem::take(&mut self.completed)
    }
}

impl Drop for PlayerHandle {
    fn drop(&mut self) {
        self.backend.stop();
    }
}

impl fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("status", &self.status)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}
