//! Error types for Focus core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// I/O error from a local store.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Record not found.
    #[error("{collection} record not found: {id}")]
    NotFound {
        /// Collection searched.
        collection: &'static str,
        /// The id that was not found.
        id: String,
    },

    /// Mutation would break a workspace invariant.
    #[error("{message}")]
    InvariantViolation {
        /// Human-readable reason.
        message: String,
    },

    /// Feature is only available on the paid plan.
    #[error("{feature} requires the Pro plan")]
    PlanRequired {
        /// Name of the gated feature.
        feature: String,
    },

    /// Input rejected before any state change.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates a not found error.
    pub fn not_found(collection: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection,
            id: id.into(),
        }
    }

    /// Creates an invariant violation error.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Creates a plan required error.
    pub fn plan_required(feature: impl Into<String>) -> Self {
        Self::PlanRequired {
            feature: feature.into(),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
