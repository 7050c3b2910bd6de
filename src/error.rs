//! Application-wide error types.
//!
//! Library modules use specific error types via `thiserror`, while the
//! CLI/main uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level application error enum
//! - Module-specific errors ([`PlayerError`], [`QueueError`], [`ConfigError`],
//!   [`ExecuteError`]) for detailed handling
//!
//! # Example
//!
//! ```ignore
//! use castminder::error::{Result, ResultExt};
//!
//! fn start(handle: &mut PlayerHandle) -> Result<()> {
//!     handle.play().map_err(Error::from).with_context("starting playback")?;
//!     Ok(())
//! }
//! ```

use crate::config::ConfigError;
use crate::executor::ExecuteError;
use crate::player::{PlayerError, QueueError};

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Player backend error
    #[error("Playback error: {0}")]
    Playback(#[from] PlayerError),

    /// Queue misuse
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// External command error
    #[error("Execute error: {0}")]
    Execute(#[from] ExecuteError),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, PlayerError> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Playback(e).context(ctx))
    }
}
