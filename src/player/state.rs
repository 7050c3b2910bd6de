//! Player state and backend snapshot types.

use std::time::Duration;

/// Current playback status of a player handle.
///
/// Transitions are `Stopped -> Playing -> {Paused <-> Playing} -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackStatus {
    /// Short label for status lines.
    pub fn label(self) -> &'static str {
        match self {
            PlaybackStatus::Stopped => "Stopped",
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
        }
    }
}

/// Last known state reported by a playback backend.
///
/// Backends refresh this in the background; reading it never blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendSnapshot {
    /// Elapsed position in the loaded media
    pub position: Duration,
    /// Total duration, once the backend has worked it out
    pub duration: Option<Duration>,
    /// Media reached its natural end
    pub finished: bool,
    /// The backend process went away without being asked to
    pub failed: bool,
}

/// Relative seek request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekDelta {
    Forward(Duration),
    Backward(Duration),
}

impl SeekDelta {
    /// Apply this delta to `position`, clamping at zero and at `duration` when known.
    pub fn apply(self, position: Duration, duration: Option<Duration>) -> Duration {
        let target = match self {
            SeekDelta::Forward(d) => position.saturating_add(d),
            SeekDelta::Backward(d) => position.saturating_sub(d),
        };
        match duration {
            Some(total) => target.min(total),
            None => target,
        }
    }

    /// Signed seconds, as the mpv `seek` command expects.
    pub fn as_secs_f64(self) -> f64 {
        match self {
            SeekDelta::Forward(d) => d.as_secs_f64(),
            SeekDelta::Backward(d) => -d.as_secs_f64(),
        }
    }
}

/// Format a duration as MM:SS or HH:MM:SS.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}
