//! Queue-driven playback controller.
//!
//! # Control Flow
//!
//! Every user command flows through [`Controller::dispatch`], regardless of
//! which key or view produced it. The controller is the only writer of the
//! queue; views read it through [`PlaybackQueue::first`] and
//! [`PlaybackQueue::iter`].
//!
//! Auto-advance happens in [`Controller::tick`]: when the head reports natural
//! completion it is removed and the next entry starts playing.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, PlaybackConfig};
use crate::executor::CommandExecutor;
use crate::model::Episode;
use crate::player::{
    BackendFactory, HandleId, MAX_RATE, MIN_RATE, PlaybackQueue, PlaybackStatus, PlayerHandle,
    SeekDelta,
};

/// Discrete user commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    PlaySelected,
    AddSelected,
    RemoveSelected,
    Clear,
    Next,
    PausePlay,
    SeekForward,
    SeekBackward,
    Execute,
    VolumeUp,
    VolumeDown,
    RateUp,
    RateDown,
}

impl Command {
    /// Human-readable name used in help and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Command::PlaySelected => "play selected",
            Command::AddSelected => "add selected to queue",
            Command::RemoveSelected => "remove selected from queue",
            Command::Clear => "clear queue",
            Command::Next => "next in queue",
            Command::PausePlay => "pause/play",
            Command::SeekForward => "seek forward",
            Command::SeekBackward => "seek backward",
            Command::Execute => "run external command",
            Command::VolumeUp => "volume up",
            Command::VolumeDown => "volume down",
            Command::RateUp => "rate up",
            Command::RateDown => "rate down",
        }
    }
}

/// What the active view has selected when a command is issued.
#[derive(Debug, Clone, Default)]
pub enum Selection {
    #[default]
    None,
    /// An episode from a feed listing
    Episode(Arc<Episode>),
    /// An entry of the queue view
    Queued(HandleId),
}

/// Translates commands into queue operations and player calls.
pub struct Controller {
    factory: Box<dyn BackendFactory>,
    playback: PlaybackConfig,
    executor: CommandExecutor,
}

impl Controller {
    pub fn new(
        factory: Box<dyn BackendFactory>,
        playback: PlaybackConfig,
        executor: CommandExecutor,
    ) -> Self {
        Self {
            factory,
            playback,
            executor,
        }
    }

    pub fn from_config(factory: Box<dyn BackendFactory>, config: &Config) -> Self {
        Self::new(
            factory,
            config.playback.clone(),
            CommandExecutor::new(config.execute.command.clone()),
        )
    }

    /// Build a stopped handle for an episode.
    pub fn build_handle(&self, episode: Arc<Episode>) -> PlayerHandle {
        PlayerHandle::new(episode, self.factory.create(), self.playback.default_volume)
    }

    /// Run one command. Returns a status message for the user, if any.
    pub fn dispatch(
        &self,
        queue: &mut PlaybackQueue,
        command: Command,
        selection: &Selection,
    ) -> Option<String> {
        tracing::debug!(target: "controller", ?command, "dispatch");
        match command {
            Command::AddSelected => self.add_selected(queue, selection),
            Command::RemoveSelected => remove_selected(queue, selection),
            Command::PlaySelected => self.play_selected(queue, selection),
            Command::Next => next(queue),
            Command::Clear => {
                queue.clear();
                Some("Cleared queue".to_string())
            }
            Command::PausePlay => pause_play(queue),
            Command::SeekForward => seek(
                queue,
                SeekDelta::Forward(Duration::from_secs(self.playback.seek_distance_forward)),
            ),
            Command::SeekBackward => seek(
                queue,
                SeekDelta::Backward(Duration::from_secs(self.playback.seek_distance_backward)),
            ),
            Command::Execute => self.execute(queue),
            Command::VolumeUp => self.adjust_volume(queue, true),
            Command::VolumeDown => self.adjust_volume(queue, false),
            Command::RateUp => self.adjust_rate(queue, self.playback.rate_adjust_distance),
            Command::RateDown => self.adjust_rate(queue, -self.playback.rate_adjust_distance),
        }
    }

    /// Poll players and auto-advance when the head finished on its own.
    pub fn tick(&self, queue: &mut PlaybackQueue) -> Option<String> {
        let mut status = None;
        for (id, e) in queue.refresh() {
            tracing::warn!(target: "controller", %id, error = %e, "player stopped unexpectedly");
            status = Some(format!("Playback error: {}", e));
        }

        if queue.take_head_completion() {
            tracing::info!(target: "controller", "head completed, advancing");
            return next(queue).or(status);
        }
        status
    }

    fn add_selected(&self, queue: &mut PlaybackQueue, selection: &Selection) -> Option<String> {
        let Selection::Episode(episode) = selection else {
            return Some("Select an episode to add".to_string());
        };
        let handle = self.build_handle(Arc::clone(episode));
        let title = handle.title().to_string();
        queue.add(handle);
        Some(format!("Added to queue: {}", title))
    }

    fn play_selected(&self, queue: &mut PlaybackQueue, selection: &Selection) -> Option<String> {
        let id = match selection {
            Selection::None => return Some("Nothing selected".to_string()),
            Selection::Queued(id) if queue.contains(*id) => *id,
            Selection::Queued(_) => return None,
            Selection::Episode(episode) => {
                let existing = queue
                    .iter()
                    .find(|h| h.episode() == episode.as_ref())
                    .map(|h| h.id());
                match existing {
                    Some(id) => id,
                    None => queue.add(self.build_handle(Arc::clone(episode))),
                }
            }
        };

        if let Err(e) = queue.promote(id) {
            tracing::error!(target: "controller", error = %e, "promote failed");
            return None;
        }
        play_head(queue)
    }

    fn execute(&self, queue: &PlaybackQueue) -> Option<String> {
        let head = queue.first()?;
        match self.executor.execute(head.episode()) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(target: "controller", error = %e, "external command failed");
                Some(format!("Command failed: {}", e))
            }
        }
    }

    fn adjust_volume(&self, queue: &mut PlaybackQueue, up: bool) -> Option<String> {
        let head = queue.first_mut()?;
        let step = self.playback.volume_adjust_distance;
        let volume = if up {
            head.volume().saturating_add(step)
        } else {
            head.volume().saturating_sub(step)
        };
        if let Err(e) = head.set_volume(volume) {
            return Some(format!("Playback error: {}", e));
        }
        Some(format!("Volume: {}%", head.volume()))
    }

    fn adjust_rate(&self, queue: &mut PlaybackQueue, delta: f32) -> Option<String> {
        let head = queue.first_mut()?;
        let rate = (head.rate() + delta).clamp(MIN_RATE, MAX_RATE);
        // Avoid drift like 1.2000001 from repeated float steps
        let rate = (rate * 100.0).round() / 100.0;
        if let Err(e) = head.set_rate(rate) {
            return Some(format!("Playback error: {}", e));
        }
        Some(format!("Rate: {:.2}x", head.rate()))
    }
}

fn remove_selected(queue: &mut PlaybackQueue, selection: &Selection) -> Option<String> {
    let Selection::Queued(id) = selection else {
        return None;
    };
    let title = queue.get(*id).map(|h| h.title().to_string());
    if queue.remove(*id) {
        title.map(|t| format!("Removed from queue: {}", t))
    } else {
        None
    }
}

fn next(queue: &mut PlaybackQueue) -> Option<String> {
    queue.remove_current_and_advance();
    if queue.is_empty() {
        return Some("Queue finished".to_string());
    }
    play_head(queue)
}

fn pause_play(queue: &mut PlaybackQueue) -> Option<String> {
    let head = queue.first()?;
    match head.state() {
        PlaybackStatus::Playing => {
            let head = queue.first_mut()?;
            match head.pause() {
                Ok(()) => Some(format!("Paused: {}", head.title())),
                Err(e) => Some(format!("Playback error: {}", e)),
            }
        }
        PlaybackStatus::Paused | PlaybackStatus::Stopped => play_head(queue),
    }
}

fn seek(queue: &mut PlaybackQueue, delta: SeekDelta) -> Option<String> {
    let head = queue.first_mut()?;
    if let Err(e) = head.seek(delta) {
        return Some(format!("Playback error: {}", e));
    }
    None
}

/// Play the head, keeping every other entry out of the playing state.
fn play_head(queue: &mut PlaybackQueue) -> Option<String> {
    let head = queue.first()?;
    let id = head.id();
    let title = head.title().to_string();
    match queue.play_exclusive(id) {
        Ok(()) => Some(format!("Playing: {}", title)),
        Err(e) => {
            tracing::warn!(target: "controller", %id, error = %e, "could not start playback");
            Some(format!("Unable to play {}: {}", title, e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ScriptedFactory, mock_episode};

    fn controller() -> (Controller, ScriptedFactory) {
        let factory = ScriptedFactory::new();
        let controller = Controller::new(
            Box::new(factory.clone()),
            PlaybackConfig::default(),
            CommandExecutor::new("castminder-no-such-program {file}"),
        );
        (controller, factory)
    }

    fn add(controller: &Controller, queue: &mut PlaybackQueue, title: &str) -> HandleId {
        controller.dispatch(
            queue,
            Command::AddSelected,
            &Selection::Episode(mock_episode(title)),
        );
        queue.iter().last().unwrap().id()
    }

    fn titles(queue: &PlaybackQueue) -> Vec<String> {
        queue.iter().map(|h| h.title().to_string()).collect()
    }

    fn playing_count(queue: &PlaybackQueue) -> usize {
        queue.iter().filter(|h| h.is_playing()).count()
    }

    #[test]
    fn test_add_selected_does_not_play() {
        let (c, factory) = controller();
        let mut queue = PlaybackQueue::new();

        let status = c.dispatch(
            &mut queue,
            Command::AddSelected,
            &Selection::Episode(mock_episode("Episode 1")),
        );
        assert_eq!(status.as_deref(), Some("Added to queue: Episode 1"));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.first().unwrap().state(), PlaybackStatus::Stopped);
        assert_eq!(factory.created(), 1);
    }

    #[test]
    fn test_add_without_episode_selected() {
        let (c, _) = controller();
        let mut queue = PlaybackQueue::new();
        c.dispatch(&mut queue, Command::AddSelected, &Selection::None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_remove_selected_first() {
        let (c, _) = controller();
        let mut queue = PlaybackQueue::new();
        let p1 = add(&c, &mut queue, "p1");
        let p2 = add(&c, &mut queue, "p2");
        add(&c, &mut queue, "p3");

        c.dispatch(&mut queue, Command::RemoveSelected, &Selection::Queued(p1));
        assert_eq!(queue.first().unwrap().id(), p2);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_remove_selected_middle() {
        let (c, _) = controller();
        let mut queue = PlaybackQueue::new();
        let p1 = add(&c, &mut queue, "p1");
        let p2 = add(&c, &mut queue, "p2");
        let p3 = add(&c, &mut queue, "p3");

        c.dispatch(&mut queue, Command::RemoveSelected, &Selection::Queued(p2));
        assert_eq!(queue.first().unwrap().id(), p1);
        assert_eq!(queue.len(), 2);

        c.dispatch(&mut queue, Command::RemoveSelected, &Selection::Queued(p3));
        assert_eq!(titles(&queue), vec!["p1"]);
    }

    #[test]
    fn test_play_selected_episode_adds_and_plays() {
        let (c, factory) = controller();
        let mut queue = PlaybackQueue::new();
        let episode = mock_episode("Fresh");

        let status = c.dispatch(
            &mut queue,
            Command::PlaySelected,
            &Selection::Episode(Arc::clone(&episode)),
        );
        assert_eq!(status.as_deref(), Some("Playing: Fresh"));
        assert!(queue.first().unwrap().is_playing());

        // Selecting the same episode again reuses the queued handle
        c.dispatch(&mut queue, Command::PlaySelected, &Selection::Episode(episode));
        assert_eq!(queue.len(), 1);
        assert_eq!(factory.created(), 1);
    }

    #[test]
    fn test_play_selected_queued_promotes_and_pauses_old_head() {
        let (c, _) = controller();
        let mut queue = PlaybackQueue::new();
        let p1 = add(&c, &mut queue, "p1");
        add(&c, &mut queue, "p2");
        let p3 = add(&c, &mut queue, "p3");

        c.dispatch(&mut queue, Command::PlaySelected, &Selection::Queued(p1));
        c.dispatch(&mut queue, Command::PlaySelected, &Selection::Queued(p3));

        assert_eq!(titles(&queue), vec!["p3", "p1", "p2"]);
        assert!(queue.first().unwrap().is_playing());
        assert_eq!(queue.get(p1).unwrap().state(), PlaybackStatus::Paused);
        assert_eq!(playing_count(&queue), 1);
    }

    #[test]
    fn test_next_plays_new_head() {
        let (c, factory) = controller();
        let mut queue = PlaybackQueue::new();
        add(&c, &mut queue, "p1");
        add(&c, &mut queue, "p2");

        c.dispatch(&mut queue, Command::PausePlay, &Selection::None);
        c.dispatch(&mut queue, Command::Next, &Selection::None);
        assert_eq!(titles(&queue), vec!["p2"]);
        assert!(queue.first().unwrap().is_playing());
        assert!(!factory.control(0).is_running());

        let status = c.dispatch(&mut queue, Command::Next, &Selection::None);
        assert_eq!(status.as_deref(), Some("Queue finished"));
        assert!(queue.is_empty());

        // Next on an empty queue is harmless
        c.dispatch(&mut queue, Command::Next, &Selection::None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear_stops_playing_head() {
        let (c, factory) = controller();
        let mut queue = PlaybackQueue::new();
        add(&c, &mut queue, "p1");
        add(&c, &mut queue, "p2");
        c.dispatch(&mut queue, Command::PausePlay, &Selection::None);
        assert!(factory.control(0).is_running());

        c.dispatch(&mut queue, Command::Clear, &Selection::None);
        assert_eq!(queue.len(), 0);
        assert!(!factory.control(0).is_running());
    }

    #[test]
    fn test_pause_play_toggles_head() {
        let (c, _) = controller();
        let mut queue = PlaybackQueue::new();
        add(&c, &mut queue, "p1");

        c.dispatch(&mut queue, Command::PausePlay, &Selection::None);
        assert_eq!(queue.first().unwrap().state(), PlaybackStatus::Playing);
        c.dispatch(&mut queue, Command::PausePlay, &Selection::None);
        assert_eq!(queue.first().unwrap().state(), PlaybackStatus::Paused);
        c.dispatch(&mut queue, Command::PausePlay, &Selection::None);
        assert_eq!(queue.first().unwrap().state(), PlaybackStatus::Playing);

        let mut empty = PlaybackQueue::new();
        assert!(c.dispatch(&mut empty, Command::PausePlay, &Selection::None).is_none());
    }

    #[test]
    fn test_seek_uses_configured_distances() {
        let (c, factory) = controller();
        let mut queue = PlaybackQueue::new();

        // Empty queue: no-op
        assert!(c.dispatch(&mut queue, Command::SeekForward, &Selection::None).is_none());

        add(&c, &mut queue, "p1");
        c.dispatch(&mut queue, Command::PausePlay, &Selection::None);
        c.dispatch(&mut queue, Command::SeekForward, &Selection::None);
        c.dispatch(&mut queue, Command::SeekBackward, &Selection::None);

        assert_eq!(
            factory.control(0).seeks(),
            vec![
                SeekDelta::Forward(Duration::from_secs(30)),
                SeekDelta::Backward(Duration::from_secs(10)),
            ]
        );
    }

    #[test]
    fn test_auto_advance_on_completion() {
        let (c, factory) = controller();
        let mut queue = PlaybackQueue::new();
        let p1 = add(&c, &mut queue, "p1");
        let p2 = add(&c, &mut queue, "p2");
        let p3 = add(&c, &mut queue, "p3");
        c.dispatch(&mut queue, Command::PausePlay, &Selection::None);

        factory.control(0).finish();
        let status = c.tick(&mut queue);

        assert_eq!(status.as_deref(), Some("Playing: p2"));
        assert!(!queue.contains(p1));
        assert_eq!(queue.first().unwrap().id(), p2);
        assert!(queue.first().unwrap().is_playing());
        assert_eq!(queue.position_of(p3), Some(1));
        assert_eq!(playing_count(&queue), 1);
    }

    #[test]
    fn test_non_head_completion_does_not_advance() {
        let (c, factory) = controller();
        let mut queue = PlaybackQueue::new();
        let p1 = add(&c, &mut queue, "p1");
        let p2 = add(&c, &mut queue, "p2");
        c.dispatch(&mut queue, Command::PausePlay, &Selection::None);
        c.dispatch(&mut queue, Command::PlaySelected, &Selection::Queued(p2));

        // p1 was paused behind the new head and its media runs out
        factory.control(0).finish();
        assert!(c.tick(&mut queue).is_none());

        assert_eq!(titles(&queue), vec!["p2", "p1"]);
        assert!(queue.first().unwrap().is_playing());
        let p1 = queue.get_mut(p1).unwrap();
        assert_eq!(p1.state(), PlaybackStatus::Stopped);
        assert!(!p1.take_completion());
    }

    #[test]
    fn test_tick_without_completion_keeps_queue() {
        let (c, _) = controller();
        let mut queue = PlaybackQueue::new();
        add(&c, &mut queue, "p1");
        add(&c, &mut queue, "p2");
        c.dispatch(&mut queue, Command::PausePlay, &Selection::None);

        assert!(c.tick(&mut queue).is_none());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_failed_play_keeps_entry_stopped() {
        let (c, factory) = controller();
        let mut queue = PlaybackQueue::new();
        add(&c, &mut queue, "p1");
        factory.control(0).fail_next_load();

        let status = c.dispatch(&mut queue, Command::PausePlay, &Selection::None).unwrap();
        assert!(status.starts_with("Unable to play p1"));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.first().unwrap().state(), PlaybackStatus::Stopped);
    }

    #[test]
    fn test_crash_reported_by_tick() {
        let (c, factory) = controller();
        let mut queue = PlaybackQueue::new();
        add(&c, &mut queue, "p1");
        c.dispatch(&mut queue, Command::PausePlay, &Selection::None);

        factory.control(0).crash();
        let status = c.tick(&mut queue).unwrap();
        assert!(status.starts_with("Playback error"));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_execute_failure_leaves_queue_alone() {
        let (c, _) = controller();
        let mut queue = PlaybackQueue::new();
        add(&c, &mut queue, "p1");

        let status = c.dispatch(&mut queue, Command::Execute, &Selection::None).unwrap();
        assert!(status.starts_with("Command failed"));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_volume_and_rate_steps() {
        let (c, factory) = controller();
        let mut queue = PlaybackQueue::new();
        add(&c, &mut queue, "p1");
        c.dispatch(&mut queue, Command::PausePlay, &Selection::None);

        c.dispatch(&mut queue, Command::VolumeDown, &Selection::None);
        assert_eq!(queue.first().unwrap().volume(), 95);
        c.dispatch(&mut queue, Command::VolumeUp, &Selection::None);
        c.dispatch(&mut queue, Command::VolumeUp, &Selection::None);
        assert_eq!(queue.first().unwrap().volume(), 100);
        assert_eq!(factory.control(0).volume(), Some(100));

        let status = c.dispatch(&mut queue, Command::RateUp, &Selection::None);
        assert_eq!(status.as_deref(), Some("Rate: 1.10x"));
        c.dispatch(&mut queue, Command::RateDown, &Selection::None);
        c.dispatch(&mut queue, Command::RateDown, &Selection::None);
        assert!((queue.first().unwrap().rate() - 0.9).abs() < 1e-6);
    }
}
