//! Talent tree cache on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::infrastructure::ports::{RepoError, TalentTreeCache};

/// One pretty-printed JSON file per class and spec, named `{class}_{spec}.json`.
///
/// Slugs are expected to be validated by the caller; this adapter joins them
/// into file names as given.
pub struct FileTalentCache {
    dir: PathBuf,
}

impl FileTalentCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn tree_path(&self, class_slug: &str, spec_slug: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.json", class_slug, spec_slug))
    }
}

#[async_trait]
impl TalentTreeCache for FileTalentCache {
    async fn load_tree(
        &self,
        class_slug: &str,
        spec_slug: &str,
    ) -> Result<Option<serde_json::Value>, RepoError> {
        let path = self.tree_path(class_slug, spec_slug);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RepoError::storage("load_tree", e)),
        };

        match serde_json::from_str(&content) {
            Ok(tree) => Ok(Some(tree)),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Ignoring unreadable talent tree"
                );
                Ok(None)
            }
        }
    }

    async fn store_tree(
        &self,
        class_slug: &str,
        spec_slug: &str,
        tree: &serde_json::Value,
    ) -> Result<(), RepoError> {
        let json = serde_json::to_string_pretty(tree).map_err(RepoError::serialization)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| RepoError::storage("store_tree", e))?;
        tokio::fs::write(self.tree_path(class_slug, spec_slug), json)
            .await
            .map_err(|e| RepoError::storage("store_tree", e))
    }

    async fn clear(&self) -> Result<(), RepoError> {
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => {
                tracing::info!(dir = %self.dir.display(), "Talent tree cache cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RepoError::storage("clear_talent_cache", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> serde_json::Value {
        serde_json::json!({"class_nodes": [{"id": 1}], "spec_nodes": [{"id": 2}]})
    }

    #[tokio::test]
    async fn stored_trees_load_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FileTalentCache::new(dir.path().join("talent_tree_cache"));

        assert_eq!(cache.load_tree("mage", "frost").await.expect("load"), None);
        cache
            .store_tree("mage", "frost", &tree())
            .await
            .expect("store");

        assert!(cache.dir().join("mage_frost.json").exists());
        assert_eq!(
            cache.load_tree("mage", "frost").await.expect("load"),
            Some(tree())
        );
        assert_eq!(cache.load_tree("mage", "fire").await.expect("load"), None);
    }

    #[tokio::test]
    async fn unreadable_tree_is_a_miss() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FileTalentCache::new(dir.path());
        std::fs::write(dir.path().join("mage_frost.json"), "{\"class_nodes\": [").expect("write");

        assert_eq!(cache.load_tree("mage", "frost").await.expect("load"), None);
    }

    #[tokio::test]
    async fn clear_removes_everything_and_tolerates_a_missing_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FileTalentCache::new(dir.path().join("talent_tree_cache"));
        cache.clear().await.expect("nothing to clear");

        cache
            .store_tree("priest", "shadow", &tree())
            .await
            .expect("store");
        cache.clear().await.expect("clear");

        assert!(!cache.dir().exists());
        assert_eq!(
            cache.load_tree("priest", "shadow").await.expect("load"),
            None
        );
    }
}
