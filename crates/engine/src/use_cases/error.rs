//! Errors surfaced by sync and roster operations.

use innkeeper_domain::DomainError;

use crate::infrastructure::ports::{FetchError, RepoError};

/// Every failure a roster operation can report. None of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The provider could not answer; the record was left as it was.
    #[error("Provider unavailable: {0}")]
    RemoteUnavailable(#[from] FetchError),

    #[error("Character {name} on {realm} is not tracked")]
    RecordNotFound { name: String, realm: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("A roster refresh is already running")]
    ConcurrentRefreshRejected,

    #[error("Persistence error: {0}")]
    Persistence(#[from] RepoError),
}

impl SyncError {
    pub fn record_not_found(name: impl Into<String>, realm: impl Into<String>) -> Self {
        Self::RecordNotFound {
            name: name.into(),
            realm: realm.into(),
        }
    }

    /// True when the provider reported that the character does not exist.
    pub fn is_remote_not_found(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(e) if e.is_not_found())
    }
}

impl From<DomainError> for SyncError {
    fn from(e: DomainError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_rejections_become_invalid_input() {
        let err: SyncError = DomainError::validation("World slot must be between 0 and 7").into();
        assert!(matches!(err, SyncError::InvalidInput(ref m) if m.contains("World slot")));
    }

    #[test]
    fn remote_not_found_is_distinguished() {
        let missing = SyncError::from(FetchError::NotFound("eu/kazzak/nobody".into()));
        assert!(missing.is_remote_not_found());
        let outage = SyncError::from(FetchError::unavailable("connection refused"));
        assert!(!outage.is_remote_not_found());
    }
}
