//! Error types for sync.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The remote store rejected a request.
    #[error("remote error on {table} (status {status}): {message}")]
    Remote {
        /// Table or endpoint addressed.
        table: String,
        /// HTTP status code.
        status: u16,
        /// Response body or description.
        message: String,
    },

    /// A response or row could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// No user is signed in.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Local state error while applying remote data.
    #[error("local error: {0}")]
    Local(#[from] focus_core::CoreError),
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a remote error.
    pub fn remote(table: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            table: table.into(),
            status,
            message: message.into(),
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Remote { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(SyncError::transport_retryable("connection reset").is_retryable());
        assert!(!SyncError::transport_fatal("bad certificate").is_retryable());
        assert!(SyncError::remote("tasks", 503, "unavailable").is_retryable());
        assert!(SyncError::remote("tasks", 429, "slow down").is_retryable());
        assert!(!SyncError::remote("tasks", 400, "bad column").is_retryable());
        assert!(!SyncError::NotAuthenticated.is_retryable());
    }

    #[test]
    fn error_display() {
        let err = SyncError::remote("goals", 404, "relation does not exist");
        assert_eq!(
            err.to_string(),
            "remote error on goals (status 404): relation does not exist"
        );
    }
}
