//! Key binding and configuration output.

use std::path::Path;

use crate::config::{self, Config};
use crate::keymap::KeyMap;

/// Print the effective key bindings
pub fn cmd_keys(config: &Config) -> anyhow::Result<()> {
    let keymap = KeyMap::from_config(&config.keys)?;
    for (key, command) in keymap.bindings() {
        println!("{:<10} {}", key.to_string(), command.name());
    }
    Ok(())
}

/// Print the effective configuration, or where it lives
pub fn cmd_config(config: &Config, explicit: Option<&Path>, path_only: bool) -> anyhow::Result<()> {
    if path_only {
        match explicit.map(Path::to_path_buf).or_else(config::config_path) {
            Some(path) => println!("{}", path.display()),
            None => anyhow::bail!("Could not determine config directory"),
        }
        return Ok(());
    }

    print!("{}", config::to_toml(config)?);
    Ok(())
}

/// Write the default configuration where it would be loaded from
pub fn cmd_config_init(explicit: Option<&Path>) -> anyhow::Result<()> {
    let defaults = Config::default();
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config::config_path().ok_or(config::ConfigError::NoConfigDir)?,
    };
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }

    match explicit {
        Some(path) => config::save_to(&defaults, path)?,
        None => config::save(&defaults)?,
    }
    println!("Wrote default config to {}", path.display());
    Ok(())
}
