//! Command-line interface for castminder.
//!
//! Stands in for the curses front end: it queues files or URLs and drives a
//! session from key names typed on stdin.

mod commands;

pub use commands::{Cli, Commands, run_command};
