//! Talent tree lookups.
//!
//! Trees change only with game patches, so a complete tree is kept on disk
//! and served from there until the cache is cleared.

use std::sync::Arc;
use std::time::Duration;

use innkeeper_domain::Region;
use serde_json::Value;

use crate::infrastructure::ports::{CharacterDataPort, FetchError, TalentTreeCache};

use super::sync::{with_deadline, SyncSettings};
use super::SyncError;

/// A talent tree and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct TalentTree {
    pub tree: Value,
    /// Served from the on-disk cache.
    pub cached: bool,
}

pub struct TalentTrees {
    port: Arc<dyn CharacterDataPort>,
    cache: Arc<dyn TalentTreeCache>,
    timeout: Duration,
}

impl TalentTrees {
    pub fn new(
        port: Arc<dyn CharacterDataPort>,
        cache: Arc<dyn TalentTreeCache>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            port,
            cache,
            timeout: settings.scan_timeout,
        }
    }

    /// The tree for one class and spec, from cache when a complete copy is stored.
    ///
    /// A freshly fetched tree is cached only if it has both node lists. Cache
    /// failures are logged and never fail the lookup.
    pub async fn fetch(
        &self,
        region: Region,
        class_slug: &str,
        spec_slug: &str,
    ) -> Result<TalentTree, SyncError> {
        check_slug("class", class_slug)?;
        check_slug("spec", spec_slug)?;

        match self.cache.load_tree(class_slug, spec_slug).await {
            Ok(Some(tree)) if is_complete(&tree) => {
                tracing::debug!(class_slug, spec_slug, "Talent tree served from cache");
                return Ok(TalentTree { tree, cached: true });
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Talent tree cache read failed"),
        }

        let request = self.port.fetch_talent_tree(region, class_slug, spec_slug);
        let tree = with_deadline(self.timeout, request).await?;
        if !has_nodes(&tree, "class_nodes") {
            return Err(FetchError::invalid(format!(
                "Server returned no data for {}/{}",
                class_slug, spec_slug
            ))
            .into());
        }

        if is_complete(&tree) {
            if let Err(e) = self.cache.store_tree(class_slug, spec_slug, &tree).await {
                tracing::warn!(error = %e, "Could not cache talent tree");
            }
        }
        Ok(TalentTree {
            tree,
            cached: false,
        })
    }

    pub async fn clear_cache(&self) -> Result<(), SyncError> {
        self.cache.clear().await?;
        Ok(())
    }
}

/// Slugs become file names, so only lowercase letters, digits and hyphens pass.
fn check_slug(what: &str, slug: &str) -> Result<(), SyncError> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(SyncError::InvalidInput(format!("Invalid {} slug: {:?}", what, slug)))
    }
}

fn has_nodes(tree: &Value, key: &str) -> bool {
    tree.get(key)
        .and_then(Value::as_array)
        .is_some_and(|nodes| !nodes.is_empty())
}

fn is_complete(tree: &Value) -> bool {
    has_nodes(tree, "class_nodes") && has_nodes(tree, "spec_nodes")
}
