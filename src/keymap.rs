//! Keyboard bindings.
//!
//! Maps input keys to [`Command`]s. Bindings come from the `[keys]` config
//! section so users can remap them; dispatch itself is a plain `match` in the
//! controller.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::config::{ConfigError, KeysConfig};
use crate::controller::Command;

/// Non-character keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NamedKey {
    Enter,
    Space,
    Left,
    Right,
    Up,
    Down,
    Delete,
    Backspace,
    Tab,
    Escape,
}

impl NamedKey {
    const ALL: [(NamedKey, &'static str); 10] = [
        (NamedKey::Enter, "enter"),
        (NamedKey::Space, "space"),
        (NamedKey::Left, "left"),
        (NamedKey::Right, "right"),
        (NamedKey::Up, "up"),
        (NamedKey::Down, "down"),
        (NamedKey::Delete, "delete"),
        (NamedKey::Backspace, "backspace"),
        (NamedKey::Tab, "tab"),
        (NamedKey::Escape, "escape"),
    ];

    fn name(self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(k, _)| *k == self)
            .map(|(_, n)| *n)
            .unwrap_or("?")
    }
}

/// A single key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Char(char),
    Named(NamedKey),
}

/// Key name that is neither a single character nor a known named key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key {0:?}")]
pub struct UnknownKey(pub String);

impl FromStr for Key {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(match c {
                ' ' => Key::Named(NamedKey::Space),
                '\t' => Key::Named(NamedKey::Tab),
                c => Key::Char(c),
            });
        }
        let lower = s.trim().to_ascii_lowercase();
        let alias = match lower.as_str() {
            "return" => "enter",
            "del" => "delete",
            "esc" => "escape",
            other => other,
        };
        NamedKey::ALL
            .iter()
            .find(|(_, name)| *name == alias)
            .map(|(k, _)| Key::Named(*k))
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c),
            Key::Named(k) => write!(f, "{}", k.name()),
        }
    }
}

/// Lookup table from keys to commands.
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    bindings: HashMap<Key, Command>,
}

impl KeyMap {
    /// Build from config. Empty names leave a command unbound.
    pub fn from_config(keys: &KeysConfig) -> Result<Self, ConfigError> {
        let entries = [
            (&keys.play_selected, Command::PlaySelected),
            (&keys.add_selected, Command::AddSelected),
            (&keys.remove_selected, Command::RemoveSelected),
            (&keys.clear, Command::Clear),
            (&keys.next, Command::Next),
            (&keys.pause_play, Command::PausePlay),
            (&keys.pause_play_alt, Command::PausePlay),
            (&keys.seek_forward, Command::SeekForward),
            (&keys.seek_forward_alt, Command::SeekForward),
            (&keys.seek_backward, Command::SeekBackward),
            (&keys.seek_backward_alt, Command::SeekBackward),
            (&keys.execute, Command::Execute),
            (&keys.volume_up, Command::VolumeUp),
            (&keys.volume_down, Command::VolumeDown),
            (&keys.rate_up, Command::RateUp),
            (&keys.rate_down, Command::RateDown),
        ];

        let mut bindings = HashMap::new();
        for (name, command) in entries {
            if name.is_empty() {
                continue;
            }
            let key: Key = name.parse().map_err(|_| ConfigError::InvalidKey {
                command: command.name().to_string(),
                name: name.clone(),
            })?;
            if let Some(existing) = bindings.insert(key, command)
                && existing != command
            {
                return Err(ConfigError::KeyConflict {
                    key: key.to_string(),
                    first: existing.name().to_string(),
                    second: command.name().to_string(),
                });
            }
        }
        Ok(Self { bindings })
    }

    pub fn lookup(&self, key: Key) -> Option<Command> {
        self.bindings.get(&key).copied()
    }

    /// All bindings sorted by key, for help output.
    pub fn bindings(&self) -> Vec<(Key, Command)> {
        let mut all: Vec<_> = self.bindings.iter().map(|(k, c)| (*k, *c)).collect();
        all.sort_by_key(|(k, _)| *k);
        all
    }
}
