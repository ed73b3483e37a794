//! Error types for port operations.

use std::path::Path;
use std::time::Duration;

/// Roster persistence errors with context for debugging.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Storage operation failed - includes operation name for tracing.
    #[error("Storage error in {operation}: {message}")]
    Storage {
        operation: &'static str,
        message: String,
    },

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The roster file exists but is not a JSON array; it is left untouched.
    #[error("Roster file {path} is unreadable (copy kept at {backup}): {message}")]
    Unreadable {
        path: String,
        backup: String,
        message: String,
    },

    /// Saving is refused because the roster on disk could not be loaded.
    #[error("Roster was not loaded; refusing to overwrite it")]
    NotLoaded,
}

impl RepoError {
    /// Create a Storage error with operation context.
    pub fn storage(operation: &'static str, message: impl ToString) -> Self {
        Self::Storage {
            operation,
            message: message.to_string(),
        }
    }

    /// Create a Serialization error.
    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    pub fn unreadable(path: &Path, backup: &Path, message: impl ToString) -> Self {
        Self::Unreadable {
            path: path.display().to_string(),
            backup: backup.display().to_string(),
            message: message.to_string(),
        }
    }
}

/// Failures talking to the character data provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The provider has no such character (or realm list).
    #[error("Not found on provider: {0}")]
    NotFound(String),

    /// Transport failure or unexpected status.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// Response arrived but could not be understood.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// The provider is already running an exclusive job, such as a realm scan.
    #[error("Provider busy: {0}")]
    Busy(String),

    /// No response within the fetch deadline.
    #[error("Provider timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl FetchError {
    pub fn unavailable(message: impl ToString) -> Self {
        Self::Unavailable(message.to_string())
    }

    pub fn invalid(message: impl ToString) -> Self {
        Self::InvalidResponse(message.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
