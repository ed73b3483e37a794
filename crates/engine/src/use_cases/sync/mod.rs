//! Get-or-refresh of provider-backed record fields.
//!
//! Every call first applies reset invalidation, then serves the cached field
//! if it is younger than the TTL, otherwise fetches and merges. The record
//! lock is never held across a fetch; a separate per-record refresh lock keeps
//! two refreshes of the same record from interleaving.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use innkeeper_domain::value_objects::{
    EquippedItem, KeystoneRun, KeystoneSummary, ProfessionSkill, RaidEncounterKill, RaidSummary,
};
use innkeeper_domain::{CacheField, CharacterKey, CharacterRecord};

use crate::infrastructure::config::{EngineConfig, DEFAULT_SCAN_TIMEOUT_SECS};
use crate::infrastructure::ports::{CharacterDataPort, CharacterLocator, ClockPort, FetchError};
use crate::stores::RosterStore;

use super::SyncError;

// =============================================================================
// Types
// =============================================================================

/// Whether a sync may be served from cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Cached,
    Force,
}

/// Progress notification delivered while a sync is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncSignal {
    /// A forced refresh is about to hit the provider.
    Refreshing {
        field: CacheField,
        name: String,
        realm: String,
    },
}

/// Receives [`SyncSignal`]s. Any `Fn(SyncSignal)` closure is an observer.
pub trait SyncObserver: Send + Sync {
    fn on_signal(&self, signal: SyncSignal);
}

impl<F> SyncObserver for F
where
    F: Fn(SyncSignal) + Send + Sync,
{
    fn on_signal(&self, signal: SyncSignal) {
        self(signal)
    }
}

/// Result of a successful sync: a snapshot of the whole record.
#[derive(Debug, Clone)]
pub struct Synced {
    pub record: CharacterRecord,
    /// Served without calling the provider.
    pub cached: bool,
    /// The record changed during this call.
    pub mutated: bool,
}

/// Timing knobs for syncing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub cache_ttl: chrono::Duration,
    pub fetch_timeout: Duration,
    /// Deadline for auto-add realm scans and talent tree requests.
    pub scan_timeout: Duration,
}

impl SyncSettings {
    pub fn new(cache_ttl: Duration, fetch_timeout: Duration) -> Self {
        Self {
            cache_ttl: chrono::Duration::from_std(cache_ttl)
                .unwrap_or_else(|_| chrono::Duration::days(365)),
            fetch_timeout,
            scan_timeout: Duration::from_secs(DEFAULT_SCAN_TIMEOUT_SECS),
        }
    }

    pub fn with_scan_timeout(mut self, scan_timeout: Duration) -> Self {
        self.scan_timeout = scan_timeout;
        self
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.cache_ttl, config.fetch_timeout).with_scan_timeout(config.scan_timeout)
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Runs `fetch` under `limit`; elapsing maps to [`FetchError::Timeout`].
pub(crate) async fn with_deadline<T, F>(limit: Duration, fetch: F) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    tokio::time::timeout(limit, fetch)
        .await
        .map_err(|_| FetchError::Timeout(limit))?
}

/// One complete fetch unit, merged only once every part has arrived.
enum Fetched {
    Equipment(Vec<EquippedItem>),
    Vault {
        keystones: Vec<KeystoneRun>,
        raids: Vec<RaidEncounterKill>,
    },
    Professions(Vec<ProfessionSkill>),
}

impl Fetched {
    fn merge_into(self, record: &mut CharacterRecord, now: DateTime<Utc>) {
        match self {
            Fetched::Equipment(items) => record.store_equipment(items, now),
            Fetched::Vault { keystones, raids } => record.store_vault(
                KeystoneSummary::from_runs(keystones),
                RaidSummary::from_encounters(&raids, now),
                now,
            ),
            Fetched::Professions(primaries) => record.store_professions(primaries, now),
        }
    }
}

// =============================================================================
// Sync Engine
// =============================================================================

pub struct SyncEngine {
    store: Arc<RosterStore>,
    port: Arc<dyn CharacterDataPort>,
    clock: Arc<dyn ClockPort>,
    settings: SyncSettings,
}

impl SyncEngine {
    pub fn new(
        store: Arc<RosterStore>,
        port: Arc<dyn CharacterDataPort>,
        clock: Arc<dyn ClockPort>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            store,
            port,
            clock,
            settings,
        }
    }

    /// Cached read of `field`, fetching only when stale.
    pub async fn get(&self, key: &CharacterKey, field: CacheField) -> Result<Synced, SyncError> {
        self.sync(key, field, SyncMode::Cached, &|_: SyncSignal| {}).await
    }

    /// Forced refetch of `field`; `observer` hears about it before the fetch starts.
    pub async fn refresh(
        &self,
        key: &CharacterKey,
        field: CacheField,
        observer: &dyn SyncObserver,
    ) -> Result<Synced, SyncError> {
        self.sync(key, field, SyncMode::Force, observer).await
    }

    /// Brings `field` of the record at `key` up to date.
    ///
    /// Unknown keys fail with `RecordNotFound` before any fetch. A failed fetch
    /// leaves the record exactly as it was, stale cache included.
    pub async fn sync(
        &self,
        key: &CharacterKey,
        field: CacheField,
        mode: SyncMode,
        observer: &dyn SyncObserver,
    ) -> Result<Synced, SyncError> {
        let slot = self
            .store
            .get(key)
            .ok_or_else(|| SyncError::record_not_found(key.name(), key.realm()))?;
        let ttl = self.settings.cache_ttl;

        let (locator, reset_fired) = {
            let mut record = slot.lock().await;
            let now = self.clock.now();
            let reset = record.apply_reset_invalidation(now);
            if mode == SyncMode::Cached && record.is_fresh(field, now, ttl) {
                let snapshot = record.clone();
                drop(record);
                if reset.fired() {
                    self.store.save().await?;
                }
                tracing::debug!(character = %key, field = %field, "Serving cached field");
                return Ok(Synced {
                    record: snapshot,
                    cached: true,
                    mutated: reset.fired(),
                });
            }
            let locator = CharacterLocator::new(record.region(), record.realm(), record.name());
            (locator, reset.fired())
        };

        if reset_fired {
            self.store.save().await?;
        }

        if mode == SyncMode::Force {
            observer.on_signal(SyncSignal::Refreshing {
                field,
                name: locator.name.clone(),
                realm: locator.realm.clone(),
            });
        }

        let _refreshing = slot.lock_refresh().await;

        // Another caller may have refreshed while we waited.
        if mode == SyncMode::Cached {
            let record = slot.lock().await;
            if record.is_fresh(field, self.clock.now(), ttl) {
                return Ok(Synced {
                    record: record.clone(),
                    cached: true,
                    mutated: reset_fired,
                });
            }
        }

        let fetched = self.fetch(field, &locator).await.map_err(|e| {
            tracing::warn!(
                character = %locator,
                field = %field,
                error = %e,
                "Fetch failed, keeping cached data"
            );
            SyncError::RemoteUnavailable(e)
        })?;

        let now = self.clock.now();
        let snapshot = {
            let mut record = slot.lock().await;
            fetched.merge_into(&mut record, now);
            record.clone()
        };
        self.store.save().await?;

        tracing::info!(character = %locator, field = %field, "Field refreshed");
        Ok(Synced {
            record: snapshot,
            cached: false,
            mutated: true,
        })
    }

    async fn fetch(
        &self,
        field: CacheField,
        who: &CharacterLocator,
    ) -> Result<Fetched, FetchError> {
        let limit = self.settings.fetch_timeout;
        match field {
            CacheField::Equipment => with_deadline(limit, self.port.fetch_equipment(who))
                .await
                .map(Fetched::Equipment),
            CacheField::Vault => {
                let (keystones, raids) = tokio::try_join!(
                    with_deadline(limit, self.port.fetch_vault_keystones(who)),
                    with_deadline(limit, self.port.fetch_vault_raids(who)),
                )?;
                Ok(Fetched::Vault { keystones, raids })
            }
            CacheField::Professions => with_deadline(limit, self.port.fetch_professions(who))
                .await
                .map(Fetched::Professions),
        }
    }
}
