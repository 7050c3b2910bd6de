//! Top-level session state.
//!
//! One [`Session`] exists per running client. It owns the queue and the
//! controller and carries the status line shown in the footer.

use crate::config::Config;
use crate::controller::{Command, Controller, Selection};
use crate::error::{Error, Result, ResultExt};
use crate::keymap::{Key, KeyMap};
use crate::player::{BackendFactory, PlaybackQueue};

pub struct Session {
    queue: PlaybackQueue,
    controller: Controller,
    keymap: KeyMap,
    status_message: String,
}

impl Session {
    pub fn new(config: &Config, factory: Box<dyn BackendFactory>) -> Result<Self> {
        let keymap = KeyMap::from_config(&config.keys)
            .map_err(Error::from)
            .with_context("loading key bindings")?;
        Ok(Self {
            queue: PlaybackQueue::new(),
            controller: Controller::from_config(factory, config),
            keymap,
            status_message: String::new(),
        })
    }

    /// Read-only view of the queue for rendering.
    pub fn queue(&self) -> &PlaybackQueue {
        &self.queue
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Handle a key press. Returns `false` if the key is not bound.
    pub fn handle_key(&mut self, key: Key, selection: &Selection) -> bool {
        match self.keymap.lookup(key) {
            Some(command) => {
                self.run(command, selection);
                true
            }
            None => false,
        }
    }

    /// Run a command directly, bypassing the key map.
    pub fn run(&mut self, command: Command, selection: &Selection) {
        if let Some(status) = self.controller.dispatch(&mut self.queue, command, selection) {
            self.set_status(status);
        }
    }

    /// Poll players; call this periodically from the UI loop.
    pub fn tick(&mut self) {
        if let Some(status) = self.controller.tick(&mut self.queue) {
            self.set_status(status);
        }
    }

    /// Stop playback and empty the queue.
    pub fn shutdown(&mut self) {
        tracing::info!(target: "session", queued = self.queue.len(), "shutting down");
        self.queue.clear();
    }

    fn set_status(&mut self, status: String) {
        tracing::debug!(target: "session", %status);
        self.status_message = status;
    }
}
