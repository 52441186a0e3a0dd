//! Error types for the timer.

use thiserror::Error;

/// Result type for timer operations.
pub type TimerResult<T> = Result<T, TimerError>;

/// Errors produced by timer input parsing.
///
/// The running timer itself never fails; these only surface when a host
/// converts untrusted input (CLI arguments, stored settings) into timer types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// Mode name is not one of the three timer modes.
    #[error("unknown timer mode: {0}")]
    UnknownMode(String),

    /// Duration must be at least one second.
    #[error("duration for {mode} must be positive")]
    ZeroDuration {
        /// Mode whose duration was rejected.
        mode: String,
    },
}
