//! CLI error type.

use focus_core::CoreError;
use focus_sync::SyncError;
use thiserror::Error;

/// Errors reported by the `focus` binary.
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid configuration file or environment.
    #[error("configuration error: {0}")]
    Config(String),

    /// Workspace or storage error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Sync error.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Runtime or terminal I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;
