//! Live character roster.
//!
//! Each record sits behind its own async mutex so operations on different
//! characters never wait on each other. A second per-record mutex serializes
//! provider refreshes without holding the record lock across network calls.
//!
//! Never call [`RosterStore::save`] while holding a record lock: saving
//! locks every record to take a snapshot.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use innkeeper_domain::{CharacterKey, CharacterRecord, Region};
use tokio::sync::{Mutex, MutexGuard};

use crate::infrastructure::ports::{RepoError, RosterRepo};

/// One roster entry.
pub struct RecordSlot {
    seq: u64,
    record: Mutex<CharacterRecord>,
    refresh: Mutex<()>,
}

impl RecordSlot {
    fn new(seq: u64, record: CharacterRecord) -> Self {
        Self {
            seq,
            record: Mutex::new(record),
            refresh: Mutex::new(()),
        }
    }

    /// Exclusive access to the record for reads and mutations.
    pub async fn lock(&self) -> MutexGuard<'_, CharacterRecord> {
        self.record.lock().await
    }

    /// Held for the whole fetch-and-merge of a refresh.
    pub async fn lock_refresh(&self) -> MutexGuard<'_, ()> {
        self.refresh.lock().await
    }

    pub async fn snapshot(&self) -> CharacterRecord {
        self.record.lock().await.clone()
    }
}

/// Roster of tracked characters, in insertion order.
pub struct RosterStore {
    records: DashMap<CharacterKey, Arc<RecordSlot>>,
    next_seq: AtomicU64,
    repo: Arc<dyn RosterRepo>,
    save_lock: Mutex<()>,
    /// Set when the persisted roster could not be read; saving would lose it.
    read_only: AtomicBool,
}

impl RosterStore {
    pub fn new(repo: Arc<dyn RosterRepo>) -> Self {
        Self {
            records: DashMap::new(),
            next_seq: AtomicU64::new(0),
            repo,
            save_lock: Mutex::new(()),
            read_only: AtomicBool::new(false),
        }
    }

    /// Loads persisted records. Later duplicates of a key are dropped.
    ///
    /// If the repo cannot load the roster, the store stops saving so the file
    /// on disk is never replaced by a partial roster.
    pub async fn load(&self) -> Result<usize, RepoError> {
        let records = match self.repo.load_roster().await {
            Ok(records) => records,
            Err(e) => {
                self.read_only.store(true, Ordering::Release);
                return Err(e);
            }
        };
        let mut loaded = 0;
        for record in records {
            let key = record.key().clone();
            if self.insert(record) {
                loaded += 1;
            } else {
                tracing::warn!(character = %key, "Duplicate roster entry ignored");
            }
        }
        tracing::info!(count = loaded, "Roster loaded");
        Ok(loaded)
    }

    /// Adds a record; returns false if one with the same key already exists.
    pub fn insert(&self, record: CharacterRecord) -> bool {
        match self.records.entry(record.key().clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                entry.insert(Arc::new(RecordSlot::new(seq, record)));
                true
            }
        }
    }

    pub fn get(&self, key: &CharacterKey) -> Option<Arc<RecordSlot>> {
        self.records.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Finds a record by name and realm in any region (earliest added wins).
    pub fn find(&self, name: &str, realm: &str) -> Option<(CharacterKey, Arc<RecordSlot>)> {
        self.records
            .iter()
            .filter(|entry| entry.key().matches_name_realm(name, realm))
            .min_by_key(|entry| entry.value().seq)
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
    }

    /// Exact key when the region is known and tracked, otherwise name and realm.
    pub fn resolve(&self, name: &str, realm: &str, region: Option<Region>) -> Option<CharacterKey> {
        let exact = region
            .and_then(|region| CharacterKey::new(name, realm, region).ok())
            .filter(|key| self.records.contains_key(key));
        exact.or_else(|| self.find(name, realm).map(|(key, _)| key))
    }

    pub fn remove(&self, key: &CharacterKey) -> bool {
        self.records.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keys and slots in insertion order.
    pub fn entries(&self) -> Vec<(CharacterKey, Arc<RecordSlot>)> {
        let mut entries: Vec<_> = self
            .records
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();
        entries.sort_by_key(|(_, slot)| slot.seq);
        entries
    }

    pub fn keys(&self) -> Vec<CharacterKey> {
        self.entries().into_iter().map(|(key, _)| key).collect()
    }

    /// Copies of every record in insertion order.
    pub async fn snapshot(&self) -> Vec<CharacterRecord> {
        let mut records = Vec::with_capacity(self.records.len());
        for (_, slot) in self.entries() {
            records.push(slot.snapshot().await);
        }
        records
    }

    /// Writes the whole roster through to the repo.
    pub async fn save(&self) -> Result<(), RepoError> {
        if self.read_only.load(Ordering::Acquire) {
            return Err(RepoError::NotLoaded);
        }
        // Snapshot under the save lock so the last writer saves the newest state.
        let _guard = self.save_lock.lock().await;
        let records = self.snapshot().await;
        self.repo.save_roster(&records).await?;
        tracing::debug!(count = records.len(), "Roster saved");
        Ok(())
    }
}
