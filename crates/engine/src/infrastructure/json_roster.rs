//! JSON file roster storage.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use innkeeper_domain::CharacterRecord;

use crate::infrastructure::ports::{RepoError, RosterRepo};

/// Stores the roster as one pretty-printed JSON array.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous roster intact.
pub struct JsonRosterRepo {
    path: PathBuf,
}

impl JsonRosterRepo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    /// Where the last roster file that could not be fully read is copied.
    pub fn backup_path(&self) -> PathBuf {
        self.sibling(".bak")
    }

    async fn back_up(&self) -> Result<PathBuf, RepoError> {
        let backup = self.backup_path();
        tokio::fs::copy(&self.path, &backup)
            .await
            .map_err(|e| RepoError::storage("backup_roster", e))?;
        Ok(backup)
    }
}

#[async_trait]
impl RosterRepo for JsonRosterRepo {
    async fn load_roster(&self) -> Result<Vec<CharacterRecord>, RepoError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No roster file yet, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(RepoError::storage("load_roster", e)),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let entries = match serde_json::from_str::<Vec<serde_json::Value>>(&content) {
            Ok(entries) => entries,
            Err(e) => {
                let backup = self.back_up().await?;
                tracing::error!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    error = %e,
                    "Roster file is unreadable"
                );
                return Err(RepoError::unreadable(&self.path, &backup, e));
            }
        };

        let total = entries.len();
        let mut records = Vec::with_capacity(total);
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<CharacterRecord>(entry) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(index, error = %e, "Skipping unreadable roster entry"),
            }
        }

        if records.len() < total {
            let backup = self.back_up().await?;
            tracing::warn!(
                skipped = total - records.len(),
                backup = %backup.display(),
                "Some roster entries were skipped; original file copied"
            );
        }

        tracing::debug!(count = records.len(), "Loaded roster");
        Ok(records)
    }

    async fn save_roster(&self, records: &[CharacterRecord]) -> Result<(), RepoError> {
        let json = serde_json::to_string_pretty(records).map_err(RepoError::serialization)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RepoError::storage("save_roster", e))?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, json)
            .await
            .map_err(|e| RepoError::storage("save_roster", e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| RepoError::storage("save_roster", e))?;

        tracing::debug!(count = records.len(), path = %self.path.display(), "Saved roster");
        Ok(())
    }
}
