//! Roster use cases.
//!
//! Adding and removing characters, user-entered tracking state, and profile
//! refreshes. Every mutation applies pending resets first and writes the
//! roster through before returning.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use innkeeper_domain::value_objects::{KnowledgeSource, Profession, WorldActivity};
use innkeeper_domain::{
    ActivityToggled, CharacterKey, CharacterRecord, DomainError, ProfileChange, Region,
};
use tokio::sync::Semaphore;

use crate::infrastructure::ports::{
    CharacterDataPort, CharacterLocator, ClockPort, RealmInfo, RemoteProfile,
};
use crate::stores::RosterStore;

use super::sync::{with_deadline, SyncSettings};
use super::SyncError;

/// Result of adding a character.
#[derive(Debug, Clone)]
pub struct AddedCharacter {
    pub record: CharacterRecord,
    /// False when the character was already tracked; `record` is then the tracked one.
    pub inserted: bool,
}

/// Result of refreshing one profile.
#[derive(Debug, Clone)]
pub struct ProfileRefresh {
    pub record: CharacterRecord,
    pub change: ProfileChange,
}

/// Result of refreshing every profile in the roster.
#[derive(Debug, Default)]
pub struct RosterRefresh {
    pub refreshed: Vec<ProfileRefresh>,
    pub failed: Vec<(CharacterKey, SyncError)>,
}

pub struct RosterUseCases {
    store: Arc<RosterStore>,
    port: Arc<dyn CharacterDataPort>,
    clock: Arc<dyn ClockPort>,
    fetch_timeout: Duration,
    scan_timeout: Duration,
    refresh_gate: Semaphore,
}

impl RosterUseCases {
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
            fetch_timeout: settings.fetch_timeout,
            scan_timeout: settings.scan_timeout,
            refresh_gate: Semaphore::new(1),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Every record with pending resets applied, in roster order.
    pub async fn list(&self) -> Result<Vec<CharacterRecord>, SyncError> {
        let now = self.clock.now();
        let mut any_fired = false;
        for (_, slot) in self.store.entries() {
            any_fired |= slot.lock().await.apply_reset_invalidation(now).fired();
        }
        if any_fired {
            self.store.save().await?;
        }
        Ok(self.store.snapshot().await)
    }

    /// Realms of `region`, sorted by name. An unknown region has none.
    pub async fn realms(&self, region: Region) -> Result<Vec<RealmInfo>, SyncError> {
        match with_deadline(self.fetch_timeout, self.port.fetch_realms(region)).await {
            Ok(realms) => Ok(realms),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    // =========================================================================
    // Roster Membership
    // =========================================================================

    /// Looks the character up on the provider and starts tracking it.
    ///
    /// The record takes the provider's spelling of name and realm. Adding an
    /// already tracked character returns the tracked record unchanged. If the
    /// roster cannot be saved the new record is dropped again.
    pub async fn add_character(
        &self,
        region: Region,
        realm: &str,
        name: &str,
    ) -> Result<AddedCharacter, SyncError> {
        let who = CharacterLocator::new(region, realm, name);
        let remote = with_deadline(self.fetch_timeout, self.port.fetch_profile(&who)).await?;
        self.track(remote).await
    }

    /// Finds `name` on whichever realm of `region` has it, then tracks it.
    ///
    /// The provider scans realms one by one, so this runs under the longer
    /// scan deadline. Only one scan runs at a time on the provider side.
    pub async fn auto_add(&self, region: Region, name: &str) -> Result<AddedCharacter, SyncError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SyncError::InvalidInput("Character name is required".to_string()));
        }
        tracing::info!(%region, name, "Scanning realms for character");
        let remote = with_deadline(self.scan_timeout, self.port.auto_add(region, name)).await?;
        self.track(remote).await
    }

    async fn track(&self, remote: RemoteProfile) -> Result<AddedCharacter, SyncError> {
        let record = CharacterRecord::new(
            &remote.name,
            &remote.realm,
            remote.region,
            remote.profile,
            self.clock.now(),
        )?;
        let key = record.key().clone();

        if self.store.insert(record) {
            if let Err(e) = self.store.save().await {
                self.store.remove(&key);
                return Err(e.into());
            }
            tracing::info!(character = %key, "Character added");
            let record = self.snapshot(&key).await?;
            return Ok(AddedCharacter {
                record,
                inserted: true,
            });
        }

        tracing::debug!(character = %key, "Character already tracked");
        Ok(AddedCharacter {
            record: self.snapshot(&key).await?,
            inserted: false,
        })
    }

    pub async fn delete(&self, name: &str, realm: &str) -> Result<CharacterKey, SyncError> {
        let (key, _) = self
            .store
            .find(name, realm)
            .ok_or_else(|| SyncError::record_not_found(name, realm))?;
        self.store.remove(&key);
        self.store.save().await?;
        tracing::info!(character = %key, "Character deleted");
        Ok(key)
    }

    // =========================================================================
    // User Tracking
    // =========================================================================

    pub async fn toggle_activity(
        &self,
        name: &str,
        realm: &str,
        activity: &str,
    ) -> Result<ActivityToggled, SyncError> {
        let (toggled, _) = self
            .mutate(name, realm, |record, _| record.toggle_activity(activity))
            .await?;
        Ok(toggled)
    }

    pub async fn set_world_slot(
        &self,
        name: &str,
        realm: &str,
        slot: usize,
        activity_type: &str,
        tier: u8,
    ) -> Result<CharacterRecord, SyncError> {
        let activity = WorldActivity::new(activity_type, tier)?;
        self.mutate_record(name, realm, |record, _| {
            record.set_world_slot(slot, activity)
        })
        .await
    }

    pub async fn clear_world_slot(
        &self,
        name: &str,
        realm: &str,
        slot: usize,
    ) -> Result<CharacterRecord, SyncError> {
        self.mutate_record(name, realm, |record, _| record.clear_world_slot(slot))
            .await
    }

    pub async fn set_moxie(
        &self,
        name: &str,
        realm: &str,
        profession: Profession,
        amount: u32,
    ) -> Result<CharacterRecord, SyncError> {
        self.mutate_record(name, realm, |record, _| {
            record.set_moxie(profession, amount);
            Ok(())
        })
        .await
    }

    /// Records a concentration reading, stamped with the current time.
    pub async fn set_concentration(
        &self,
        name: &str,
        realm: &str,
        profession: Profession,
        current: u32,
    ) -> Result<CharacterRecord, SyncError> {
        self.mutate_record(name, realm, |record, now| {
            record.set_concentration(profession, current, now)
        })
        .await
    }

    pub async fn toggle_spark(
        &self,
        name: &str,
        realm: &str,
    ) -> Result<CharacterRecord, SyncError> {
        self.mutate_record(name, realm, |record, now| {
            record.toggle_spark(now);
            Ok(())
        })
        .await
    }

    pub async fn toggle_knowledge(
        &self,
        name: &str,
        realm: &str,
        profession: Profession,
        source: KnowledgeSource,
    ) -> Result<CharacterRecord, SyncError> {
        self.mutate_record(name, realm, |record, _| {
            record.toggle_knowledge(profession, source);
            Ok(())
        })
        .await
    }

    /// Starts or stops tracking a decor item.
    pub async fn track_decor(
        &self,
        name: &str,
        realm: &str,
        item: &str,
        materials: &[String],
    ) -> Result<CharacterRecord, SyncError> {
        self.mutate_record(name, realm, |record, _| {
            record.toggle_decor(item, materials).map(|_| ())
        })
        .await
    }

    pub async fn set_decor_material(
        &self,
        name: &str,
        realm: &str,
        item: &str,
        material: &str,
        amount: u32,
    ) -> Result<CharacterRecord, SyncError> {
        self.mutate_record(name, realm, |record, _| {
            record.set_decor_material(item, material, amount)
        })
        .await
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Applies pending resets to every record and drops cached vault data so
    /// it is rederived with current reward tables, then saves.
    pub async fn startup_sweep(&self) -> Result<usize, SyncError> {
        let now = self.clock.now();
        let entries = self.store.entries();
        for (key, slot) in &entries {
            let mut record = slot.lock().await;
            let outcome = record.apply_reset_invalidation(now);
            record.clear_vault_cache();
            if outcome.fired() {
                tracing::debug!(
                    character = %key,
                    activities = outcome.activities_reset.len(),
                    vault = outcome.vault_cleared,
                    professions = outcome.professions_cleared,
                    "Resets applied"
                );
            }
        }
        self.store.save().await?;
        tracing::info!(count = entries.len(), "Startup sweep complete");
        Ok(entries.len())
    }

    /// Refetches the profile of the record at `key` and overwrites it wholesale.
    pub async fn refresh_profile(&self, key: &CharacterKey) -> Result<ProfileRefresh, SyncError> {
        let slot = self
            .store
            .get(key)
            .ok_or_else(|| SyncError::record_not_found(key.name(), key.realm()))?;
        let _refreshing = slot.lock_refresh().await;

        let who = {
            let record = slot.lock().await;
            CharacterLocator::new(record.region(), record.realm(), record.name())
        };
        let remote = with_deadline(self.fetch_timeout, self.port.fetch_profile(&who)).await?;

        let (change, record) = {
            let mut record = slot.lock().await;
            let change = record.replace_profile(remote.profile);
            (change, record.clone())
        };
        self.store.save().await?;

        if let ProfileChange::SpecChanged { from, to } = &change {
            tracing::info!(character = %key, from = %from, to = %to, "Spec changed");
        }
        Ok(ProfileRefresh { record, change })
    }

    /// Refreshes every profile in roster order, one bulk refresh at a time.
    ///
    /// A second call while one is running fails with
    /// `ConcurrentRefreshRejected`. Per-character failures are collected, not
    /// propagated.
    pub async fn refresh_roster(&self) -> Result<RosterRefresh, SyncError> {
        let _permit = self
            .refresh_gate
            .try_acquire()
            .map_err(|_| SyncError::ConcurrentRefreshRejected)?;

        let mut outcome = RosterRefresh::default();
        for key in self.store.keys() {
            match self.refresh_profile(&key).await {
                Ok(refresh) => outcome.refreshed.push(refresh),
                Err(e) => {
                    tracing::warn!(character = %key, error = %e, "Profile refresh failed");
                    outcome.failed.push((key, e));
                }
            }
        }
        tracing::info!(
            refreshed = outcome.refreshed.len(),
            failed = outcome.failed.len(),
            "Roster refresh complete"
        );
        Ok(outcome)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn snapshot(&self, key: &CharacterKey) -> Result<CharacterRecord, SyncError> {
        let slot = self
            .store
            .get(key)
            .ok_or_else(|| SyncError::record_not_found(key.name(), key.realm()))?;
        Ok(slot.snapshot().await)
    }

    /// Runs `change` on the record found by name and realm, then saves.
    ///
    /// Pending resets are applied first. `change` works on a copy, so a
    /// rejected change never reaches the record; resets that fired are still
    /// kept and saved.
    async fn mutate<T, F>(
        &self,
        name: &str,
        realm: &str,
        change: F,
    ) -> Result<(T, CharacterRecord), SyncError>
    where
        F: FnOnce(&mut CharacterRecord, DateTime<Utc>) -> Result<T, DomainError>,
    {
        let (key, slot) = self
            .store
            .find(name, realm)
            .ok_or_else(|| SyncError::record_not_found(name, realm))?;

        let now = self.clock.now();
        let (applied, reset_fired) = {
            let mut record = slot.lock().await;
            let reset_fired = record.apply_reset_invalidation(now).fired();
            let mut draft = record.clone();
            let applied = change(&mut draft, now).map(|value| {
                *record = draft;
                (value, record.clone())
            });
            (applied, reset_fired)
        };

        match applied {
            Ok((value, snapshot)) => {
                self.store.save().await?;
                Ok((value, snapshot))
            }
            Err(e) => {
                if reset_fired {
                    if let Err(save) = self.store.save().await {
                        tracing::warn!(character = %key, error = %save, "Saving resets failed");
                    }
                }
                Err(e.into())
            }
        }
    }

    async fn mutate_record<F>(
        &self,
        name: &str,
        realm: &str,
        change: F,
    ) -> Result<CharacterRecord, SyncError>
    where
        F: FnOnce(&mut CharacterRecord, DateTime<Utc>) -> Result<(), DomainError>,
    {
        self.mutate(name, realm, change).await.map(|(_, record)| record)
    }
}
