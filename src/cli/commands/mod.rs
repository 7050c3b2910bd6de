//! CLI command definitions and dispatch.
//!
//! Each subcommand lives in its own submodule:
//! - `play`: queue media and run an interactive session
//! - `info`: print key bindings and configuration

mod info;
mod play;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{self, Config};

pub use info::{cmd_config, cmd_config_init, cmd_keys};
pub use play::cmd_play;

/// castminder CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "CASTMINDER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Queue files or URLs and play them, reading key names from stdin
    Play {
        /// Media files or URLs, in play order
        #[arg(required = true)]
        locators: Vec<String>,
        /// Queue everything but don't start the first entry
        #[arg(long)]
        no_autoplay: bool,
    },
    /// Print the effective key bindings
    Keys,
    /// Print the effective configuration
    Config {
        /// Print the config file path instead
        #[arg(long, conflicts_with = "init")]
        path: bool,
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

/// Load config from `--config` if given, otherwise from the default location.
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    match &cli.config {
        Some(path) => Ok(config::load_from(path)?),
        None => Ok(config::load()),
    }
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli)?;

    match &cli.command {
        Commands::Play {
            locators,
            no_autoplay,
        } => cmd_play(&config, locators, !*no_autoplay),
        Commands::Keys => cmd_keys(&config),
        Commands::Config { path, init } => {
            if *init {
                cmd_config_init(cli.config.as_deref())
            } else {
                cmd_config(&config, cli.config.as_deref(), *path)
            }
        }
    }
}
