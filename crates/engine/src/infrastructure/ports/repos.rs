//! Persistence ports: the roster and the talent tree cache.

use async_trait::async_trait;
use innkeeper_domain::CharacterRecord;

use super::error::RepoError;

/// Durable storage for the whole roster.
///
/// The roster is small, so it is always loaded and saved as a unit, in
/// display order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RosterRepo: Send + Sync {
    /// Loads every stored record. Missing storage is an empty roster.
    async fn load_roster(&self) -> Result<Vec<CharacterRecord>, RepoError>;

    /// Replaces stored contents with `records`.
    async fn save_roster(&self, records: &[CharacterRecord]) -> Result<(), RepoError>;
}

/// On-disk cache of talent trees, one entry per class and spec.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TalentTreeCache: Send + Sync {
    /// The cached tree, or `None` when nothing usable is stored.
    async fn load_tree(
        &self,
        class_slug: &str,
        spec_slug: &str,
    ) -> Result<Option<serde_json::Value>, RepoError>;

    async fn store_tree(
        &self,
        class_slug: &str,
        spec_slug: &str,
        tree: &serde_json::Value,
    ) -> Result<(), RepoError>;

    /// Drops every cached tree.
    async fn clear(&self) -> Result<(), RepoError>;
}
