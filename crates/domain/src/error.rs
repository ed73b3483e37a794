//! Unified error types for the domain layer
//!
//! Every rule in this crate that can reject input returns `DomainError`, so the
//! engine can map rejections to `InvalidInput` before any record is touched.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., slot index out of range, empty name)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Entity not found inside an aggregate (e.g., untracked decor item)
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Parse error (for enumerated keys)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Creates a validation error for rejected input.
    ///
    /// # Example
    /// ```
    /// use innkeeper_domain::DomainError;
    ///
    /// let err = DomainError::validation("World slot must be between 0 and 7");
    /// assert!(matches!(err, DomainError::Validation(_)));
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a parse error for string-to-type conversion failures.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
