//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\castminder\config.toml
//! - macOS: ~/Library/Application Support/castminder/config.toml
//! - Linux: ~/.config/castminder/config.toml
//!
//! Every section falls back to defaults, so a file only needs the keys the
//! user wants to change.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External player process settings
    pub player: PlayerConfig,

    /// Seek, volume and rate behaviour
    pub playback: PlaybackConfig,

    /// External command run against the current episode
    pub execute: ExecuteConfig,

    /// Key bindings
    pub keys: KeysConfig,
}

/// External player process settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Player executable (must speak the mpv JSON IPC protocol)
    pub command: String,

    /// Extra arguments passed before the IPC options
    pub extra_args: Vec<String>,

    /// How long to wait for the IPC socket after spawning, in milliseconds.
    /// Starting playback blocks the caller for at most this long.
    pub ipc_timeout_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            command: "mpv".to_string(),
            extra_args: vec!["--no-video".to_string()],
            ipc_timeout_ms: 1000,
        }
    }
}

impl PlayerConfig {
    pub fn ipc_timeout(&self) -> Duration {
        Duration::from_millis(self.ipc_timeout_ms)
    }
}

/// Seek, volume and rate behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Seconds to skip forward
    pub seek_distance_forward: u64,

    /// Seconds to skip backward
    pub seek_distance_backward: u64,

    /// Volume applied to newly started players (0 - 100)
    pub default_volume: u8,

    /// Volume step for volume up/down
    pub volume_adjust_distance: u8,

    /// Rate step for rate up/down
    pub rate_adjust_distance: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            seek_distance_forward: 30,
            seek_distance_backward: 10,
            default_volume: 100,
            volume_adjust_distance: 5,
            rate_adjust_distance: 0.1,
        }
    }
}

/// External command settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecuteConfig {
    /// Command template; `{file}` is replaced by the episode's media locator
    pub command: String,
}

impl Default for ExecuteConfig {
    fn default() -> Self {
        Self {
            command: "xdg-open {file}".to_string(),
        }
    }
}

/// Key bindings, one key name per command.
///
/// Names are single characters or one of `enter`, `space`, `left`, `right`,
/// `up`, `down`, `delete`, `backspace`, `tab`, `escape`. An empty string
/// leaves the command unbound.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    pub play_selected: String,
    pub add_selected: String,
    pub remove_selected: String,
    pub clear: String,
    pub next: String,
    pub pause_play: String,
    pub pause_play_alt: String,
    pub seek_forward: String,
    pub seek_forward_alt: String,
    pub seek_backward: String,
    pub seek_backward_alt: String,
    pub execute: String,
    pub volume_up: String,
    pub volume_down: String,
    pub rate_up: String,
    pub rate_down: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            play_selected: "enter".to_string(),
            add_selected: "a".to_string(),
            remove_selected: "d".to_string(),
            clear: "c".to_string(),
            next: "n".to_string(),
            pause_play: "p".to_string(),
            pause_play_alt: "space".to_string(),
            seek_forward: "right".to_string(),
            seek_forward_alt: "f".to_string(),
            seek_backward: "left".to_string(),
            seek_backward_alt: "b".to_string(),
            execute: "e".to_string(),
            volume_up: "=".to_string(),
            volume_down: "-".to_string(),
            rate_up: "]".to_string(),
            rate_down: "[".to_string(),
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("castminder"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match load_from(&path) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", path);
            config
        }
        Err(e) => {
            tracing::error!("{}", e);
            tracing::warn!("Using default configuration");
            Config::default()
        }
    }
}

/// Load configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
}

/// Save configuration to the default location
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &path)
}

/// Save configuration to an explicit path.
///
/// Creates the parent directory if it doesn't exist.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = to_toml(config)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

/// Serialize to pretty TOML.
pub fn to_toml(config: &Config) -> Result<String, ConfigError> {
    toml::to_string_pretty(config).map_err(ConfigError::Serialize)
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),

    #[error("Unknown key name {name:?} bound to {command}")]
    InvalidKey { command: String, name: String },

    #[error("Key {key} is bound to both {first} and {second}")]
    KeyConflict {
        key: String,
        first: String,
        second: String,
    },
}

// ============================================================================
// Tests
// ============================================================================
