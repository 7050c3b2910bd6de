//! Test utilities and fixtures for castminder tests.
//!
//! Provides a scripted in-memory [`PlaybackBackend`] and factories for
//! episodes and handles, so queue and controller tests never spawn a real
//! player process.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::scripted_handle;
//!
//! let (mut handle, control) = scripted_handle("Episode 1");
//! handle.play().unwrap();
//! control.finish(); // pretend the media ran out
//! handle.refresh().unwrap();
//! assert!(handle.take_completion());
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::model::Episode;
use crate::player::{
    BackendFactory, BackendSnapshot, PlaybackBackend, PlayerError, PlayerHandle, SeekDelta,
};

/// Everything a scripted backend has been asked to do.
#[derive(Debug, Default)]
struct Script {
    running: bool,
    paused: bool,
    loads: usize,
    stops: usize,
    seeks: Vec<SeekDelta>,
    volume: Option<u8>,
    rate: Option<f32>,
    fail_next_load: bool,
    snapshot: BackendSnapshot,
}

/// Test-side view of a [`ScriptedBackend`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedControl {
    script: Arc<Mutex<Script>>,
}

impl ScriptedControl {
    /// Whether an external "process" is currently alive.
    pub fn is_running(&self) -> bool {
        self.script.lock().running
    }

    pub fn is_paused(&self) -> bool {
        self.script.lock().paused
    }

    pub fn loads(&self) -> usize {
        self.script.lock().loads
    }

    /// Stops that actually released a running process.
    pub fn stops(&self) -> usize {
        self.script.lock().stops
    }

    pub fn seeks(&self) -> Vec<SeekDelta> {
        self.script.lock().seeks.clone()
    }

    pub fn volume(&self) -> Option<u8> {
        self.script.lock().volume
    }

    pub fn rate(&self) -> Option<f32> {
        self.script.lock().rate
    }

    /// Make the next `load` fail as if the player could not be spawned.
    pub fn fail_next_load(&self) {
        self.script.lock().fail_next_load = true;
    }

    pub fn set_progress(&self, position: Duration, duration: Option<Duration>) {
        let mut script = self.script.lock();
        script.snapshot.position = position;
        script.snapshot.duration = duration;
    }

    /// Report natural end of media.
    pub fn finish(&self) {
        let mut script = self.script.lock();
        if script.running {
            script.snapshot.finished = true;
        }
    }

    /// Report that the process died.
    pub fn crash(&self) {
        let mut script = self.script.lock();
        if script.running {
            script.snapshot.failed = true;
        }
    }
}

/// In-memory backend driven by a [`ScriptedControl`].
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    control: ScriptedControl,
}

impl ScriptedBackend {
    pub fn new() -> (Self, ScriptedControl) {
        let backend = Self::default();
        let control = backend.control.clone();
        (backend, control)
    }
}

impl PlaybackBackend for ScriptedBackend {
    fn load(&mut self, locator: &str) -> Result<(), PlayerError> {
        let mut script = self.control.script.lock();
        if std::mem::take(&mut script.fail_next_load) {
            return Err(PlayerError::Spawn(format!("scripted failure for {}", locator)));
        }
        script.loads += 1;
        script.running = true;
        script.paused = false;
        script.snapshot = BackendSnapshot::default();
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        let mut script = self.control.script.lock();
        if !script.running {
            return Err(PlayerError::NotLoaded);
        }
        script.paused = false;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        let mut script = self.control.script.lock();
        if !script.running {
            return Err(PlayerError::NotLoaded);
        }
        script.paused = true;
        Ok(())
    }

    fn stop(&mut self) {
        let mut script = self.control.script.lock();
        if script.running {
            script.stops += 1;
        }
        script.running = false;
        script.paused = false;
        script.snapshot = BackendSnapshot::default();
    }

    fn seek(&mut self, delta: SeekDelta) -> Result<(), PlayerError> {
        let mut script = self.control.script.lock();
        script.seeks.push(delta);
        let duration = script.snapshot.duration;
        script.snapshot.position = delta.apply(script.snapshot.position, duration);
        Ok(())
    }

    fn set_volume(&mut self, percent: u8) -> Result<(), PlayerError> {
        self.control.script.lock().volume = Some(percent);
        Ok(())
    }

    fn set_rate(&mut self, rate: f32) -> Result<(), PlayerError> {
        self.control.script.lock().rate = Some(rate);
        Ok(())
    }

    fn snapshot(&self) -> BackendSnapshot {
        self.control.script.lock().snapshot.clone()
    }
}

/// Factory that hands out scripted backends and remembers their controls in
/// creation order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFactory {
    controls: Arc<Mutex<Vec<ScriptedControl>>>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Control for the `n`th backend created.
    pub fn control(&self, n: usize) -> ScriptedControl {
        self.controls.lock()[n].clone()
    }

    pub fn created(&self) -> usize {
        self.controls.lock().len()
    }
}

impl BackendFactory for ScriptedFactory {
    fn create(&self) -> Box<dyn PlaybackBackend> {
        let (backend, control) = ScriptedBackend::new();
        self.controls.lock().push(control);
        Box::new(backend)
    }
}

/// Creates a mock episode with sensible defaults.
pub fn mock_episode(title: &str) -> Arc<Episode> {
    Arc::new(Episode {
        title: title.to_string(),
        feed_title: "Test Feed".to_string(),
        description: "episode description".to_string(),
        link: "https://example.com/episode".to_string(),
        pubdate: "Mon, 01 Jan 2024 00:00:00 +0000".to_string(),
        copyright: "episode copyright".to_string(),
        enclosure: format!("https://example.com/{}.mp3", title.replace(' ', "_")),
        downloaded: None,
    })
}

/// Creates a stopped handle over a scripted backend.
pub fn scripted_handle(title: &str) -> (PlayerHandle, ScriptedControl) {
    let (backend, control) = ScriptedBackend::new();
    let handle = PlayerHandle::new(mock_episode(title), Box::new(backend), 100);
    (handle, control)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_episode_defaults() {
        let episode = mock_episode("Episode 7");
        assert_eq!(episode.title, "Episode 7");
        assert_eq!(episode.media_locator(), "https://example.com/Episode_7.mp3");
    }

    #[test]
    fn test_scripted_backend_lifecycle() {
        let (mut backend, control) = ScriptedBackend::new();
        assert!(backend.pause().is_err());

        backend.load("a.mp3").unwrap();
        assert!(control.is_running());
        backend.pause().unwrap();
        assert!(control.is_paused());

        control.finish();
        assert!(backend.completion_signal());

        backend.stop();
        assert!(!control.is_running());
        assert!(!backend.completion_signal());
        assert_eq!(control.stops(), 1);
    }

    #[test]
    fn test_factory_tracks_controls() {
        let factory = ScriptedFactory::new();
        let _a = factory.create();
        let _b = factory.create();
        assert_eq!(factory.created(), 2);
        assert!(!factory.control(1).is_running());
    }
}
