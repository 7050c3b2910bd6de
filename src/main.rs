//! castminder - a terminal podcast client core.
//!
//! Queues episodes, drives an external player for each one, and advances
//! through the queue as episodes finish. The curses front end, feed fetching
//! and the episode database are separate collaborators; the CLI here drives
//! a session from stdin.

pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod executor;
pub mod keymap;
pub mod model;
pub mod player;
pub mod session;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging (stderr, so it doesn't mix with status output)
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    cli::run_command(&args)
}
