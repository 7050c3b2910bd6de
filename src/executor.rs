//! External command execution against an episode.
//!
//! The template is split on whitespace and `{file}` is substituted inside each
//! argument, so a locator containing spaces stays a single argument. The
//! child is reaped on a background thread; its exit status is only logged.

use std::process::{Command, Stdio};
use std::thread;

use crate::model::Episode;

/// Placeholder replaced by the episode's media locator.
pub const FILE_PLACEHOLDER: &str = "{file}";

/// External command errors
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error("Execute command is empty")]
    EmptyCommand,

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs the configured command template.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    template: String,
}

impl CommandExecutor {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Program and arguments for `episode`.
    pub fn build_args(&self, episode: &Episode) -> Result<Vec<String>, ExecuteError> {
        let locator = episode.media_locator();
        let args: Vec<String> = self
            .template
            .split_whitespace()
            .map(|part| part.replace(FILE_PLACEHOLDER, &locator))
            .collect();
        if args.is_empty() {
            return Err(ExecuteError::EmptyCommand);
        }
        Ok(args)
    }

    /// Spawn the command without waiting for it.
    pub fn execute(&self, episode: &Episode) -> Result<(), ExecuteError> {
        let args = self.build_args(episode)?;
        let (program, rest) = args.split_first().ok_or(ExecuteError::EmptyCommand)?;

        let mut child = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ExecuteError::Spawn {
                program: program.clone(),
                source,
            })?;

        tracing::info!(target: "executor", program = %program, title = %episode.title, "started external command");

        let program = program.clone();
        let reaper = thread::Builder::new()
            .name("execute-reaper".to_string())
            .spawn(move || match child.wait() {
                Ok(status) if status.success() => {
                    tracing::debug!(target: "executor", %program, "external command finished");
                }
                Ok(status) => {
                    tracing::warn!(target: "executor", %program, %status, "external command failed");
                }
                Err(e) => {
                    tracing::warn!(target: "executor", %program, error = %e, "could not wait for external command");
                }
            });
        if let Err(e) = reaper {
            tracing::warn!(target: "executor", error = %e, "could not start reaper thread");
        }
        Ok(())
    }
}
