//! Character record aggregate - one tracked character and everything cached about it
//!
//! # Design
//!
//! - **Private fields**: mutation only through methods, so timestamps and
//!   caches can never drift apart
//! - **Outcome values**: mutations report what changed (`ResetOutcome`,
//!   `ProfileChange`, `ActivityToggled`)
//! - **Time is injected**: every method that stamps or compares takes `now`
//!
//! # Reset invalidation
//!
//! `apply_reset_invalidation` is the only place weekly and daily state is
//! cleared. It is idempotent for a given `now`, and after a gap of several
//! weeks it clears once and stamps once.

use std::collections::BTreeMap;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;
use crate::events::{ActivityToggled, ProfileChange, ResetOutcome};
use crate::identity::{CharacterKey, Region};
use crate::persisted;
use crate::reset_clock::{boundary, weekly_boundary};
use crate::value_objects::{
    default_activities, Activity, ActivityStatus, Concentration, DecorTracking, EquippedItem,
    KeystoneSummary, KnowledgeSource, Profession, ProfessionSkill, ProfessionState,
    ProfileSnapshot, RaidSummary, VaultState, WorldActivity, WorldSlots,
};

/// Independently cached groups of provider data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheField {
    Equipment,
    Vault,
    Professions,
}

impl CacheField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equipment => "equipment",
            Self::Vault => "vault",
            Self::Professions => "professions",
        }
    }
}

impl std::fmt::Display for CacheField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn within_ttl(last_check: Option<DateTime<Utc>>, now: DateTime<Utc>, ttl: Duration) -> bool {
    last_check.is_some_and(|at| now - at < ttl)
}

/// A tracked character.
///
/// # Invariants
///
/// - `key` always matches the folded `name`, `realm` and `region`
/// - `last_reset_check` never moves backwards
/// - exactly eight world slots (enforced by `WorldSlots`)
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use innkeeper_domain::aggregates::CharacterRecord;
/// use innkeeper_domain::value_objects::ProfileSnapshot;
/// use innkeeper_domain::Region;
///
/// let now = Utc::now();
/// let profile = ProfileSnapshot::new(80, Some(8), "Mage", "Frost", 620);
/// let record = CharacterRecord::new("Jaina", "Kazzak", Region::Eu, profile, now).expect("valid");
///
/// assert_eq!(record.name(), "Jaina");
/// assert_eq!(record.activities().len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterRecord {
    // Identity
    key: CharacterKey,
    name: String,
    realm: String,
    region: Region,

    // Provider data
    profile: ProfileSnapshot,
    equipment: Vec<EquippedItem>,
    equipment_last_check: Option<DateTime<Utc>>,
    vault: VaultState,
    professions: ProfessionState,

    // User tracking
    decor: DecorTracking,
    activities: BTreeMap<String, Activity>,

    last_reset_check: DateTime<Utc>,
}

impl CharacterRecord {
    // =========================================================================
    // Constructor
    // =========================================================================

    /// Creates a record from a freshly fetched profile, with default activities.
    pub fn new(
        name: &str,
        realm: &str,
        region: Region,
        profile: ProfileSnapshot,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let key = CharacterKey::new(name, realm, region)?;
        Ok(Self {
            key,
            name: name.trim().to_string(),
            realm: realm.trim().to_string(),
            region,
            profile,
            equipment: Vec::new(),
            equipment_last_check: None,
            vault: VaultState::default(),
            professions: ProfessionState::default(),
            decor: DecorTracking::default(),
            activities: default_activities(),
            last_reset_check: now,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn key(&self) -> &CharacterKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn profile(&self) -> &ProfileSnapshot {
        &self.profile
    }

    pub fn equipment(&self) -> &[EquippedItem] {
        &self.equipment
    }

    pub fn equipment_last_check(&self) -> Option<DateTime<Utc>> {
        self.equipment_last_check
    }

    pub fn vault(&self) -> &VaultState {
        &self.vault
    }

    pub fn professions(&self) -> &ProfessionState {
        &self.professions
    }

    pub fn decor(&self) -> &DecorTracking {
        &self.decor
    }

    pub fn activities(&self) -> &BTreeMap<String, Activity> {
        &self.activities
    }

    pub fn last_reset_check(&self) -> DateTime<Utc> {
        self.last_reset_check
    }

    /// Timestamp of the last successful fetch of `field`.
    pub fn last_check(&self, field: CacheField) -> Option<DateTime<Utc>> {
        match field {
            CacheField::Equipment => self.equipment_last_check,
            CacheField::Vault => self.vault.last_check,
            CacheField::Professions => self.professions.last_check,
        }
    }

    /// Whether `field` was fetched less than `ttl` ago.
    ///
    /// An empty equipment list is never fresh.
    pub fn is_fresh(&self, field: CacheField, now: DateTime<Utc>, ttl: Duration) -> bool {
        match field {
            CacheField::Equipment => {
                !self.equipment.is_empty() && within_ttl(self.equipment_last_check, now, ttl)
            }
            CacheField::Vault | CacheField::Professions => {
                within_ttl(self.last_check(field), now, ttl)
            }
        }
    }

    // =========================================================================
    // Reset Invalidation
    // =========================================================================

    /// Clears whatever daily or weekly state has expired as of `now`.
    pub fn apply_reset_invalidation(&mut self, now: DateTime<Utc>) -> ResetOutcome {
        let weekly = weekly_boundary(now);
        let mut outcome = ResetOutcome::default();

        for (name, activity) in self.activities.iter_mut() {
            if self.last_reset_check < boundary(activity.cadence, now) {
                activity.status = ActivityStatus::Available;
                outcome.activities_reset.push(name.clone());
            }
        }

        if self.vault.world_last_reset.map_or(true, |at| at < weekly) {
            self.vault.world.clear_all();
            self.vault.clear_fetched();
            self.vault.world_last_reset = Some(now);
            outcome.vault_cleared = true;
        }

        if self
            .professions
            .knowledge_last_reset
            .map_or(true, |at| at < weekly)
        {
            self.professions.reset_weekly(now);
            outcome.professions_cleared = true;
        }

        if outcome.fired() {
            self.last_reset_check = self.last_reset_check.max(now);
        }
        outcome
    }

    // =========================================================================
    // Provider Data
    // =========================================================================

    /// Replaces the profile snapshot wholesale.
    pub fn replace_profile(&mut self, profile: ProfileSnapshot) -> ProfileChange {
        let previous = std::mem::replace(&mut self.profile, profile);
        if previous.spec_name == self.profile.spec_name {
            ProfileChange::Unchanged
        } else {
            ProfileChange::SpecChanged {
                from: previous.spec_name,
                to: self.profile.spec_name.clone(),
            }
        }
    }

    pub fn store_equipment(&mut self, items: Vec<EquippedItem>, now: DateTime<Utc>) {
        self.equipment = items;
        self.equipment_last_check = Some(now);
    }

    pub fn store_vault(
        &mut self,
        keystones: KeystoneSummary,
        raids: RaidSummary,
        now: DateTime<Utc>,
    ) {
        self.vault.mythic_plus = Some(keystones);
        self.vault.raids = Some(raids);
        self.vault.last_check = Some(now);
    }

    pub fn store_professions(&mut self, primaries: Vec<ProfessionSkill>, now: DateTime<Utc>) {
        self.professions.primaries = primaries;
        self.professions.last_check = Some(now);
    }

    /// Drops fetched vault data so it is recomputed on next read.
    pub fn clear_vault_cache(&mut self) {
        self.vault.clear_fetched();
    }

    // =========================================================================
    // User Tracking
    // =========================================================================

    pub fn toggle_activity(&mut self, activity: &str) -> Result<ActivityToggled, DomainError> {
        let entry = self
            .activities
            .get_mut(activity)
            .ok_or_else(|| DomainError::not_found("Activity", activity))?;
        entry.status = entry.status.toggled();
        Ok(ActivityToggled {
            activity: activity.to_string(),
            status: entry.status,
        })
    }

    pub fn set_world_slot(
        &mut self,
        slot: usize,
        activity: WorldActivity,
    ) -> Result<(), DomainError> {
        self.vault.world.set(slot, activity)
    }

    pub fn clear_world_slot(&mut self, slot: usize) -> Result<(), DomainError> {
        self.vault.world.clear(slot)
    }

    pub fn set_moxie(&mut self, profession: Profession, amount: u32) {
        self.professions.moxie.insert(profession, amount);
    }

    /// Records the user's concentration reading, stamped with `now`.
    pub fn set_concentration(
        &mut self,
        profession: Profession,
        current: u32,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let concentration = Concentration::new(current, now)?;
        self.professions.concentration.insert(profession, concentration);
        Ok(())
    }

    pub fn concentration_time_to_full(
        &self,
        profession: Profession,
        now: DateTime<Utc>,
    ) -> StdDuration {
        self.professions
            .concentration
            .get(&profession)
            .map(|c| c.time_to_full(now))
            .unwrap_or(StdDuration::ZERO)
    }

    pub fn toggle_spark(&mut self, now: DateTime<Utc>) -> bool {
        self.professions.toggle_spark(now)
    }

    pub fn toggle_knowledge(&mut self, profession: Profession, source: KnowledgeSource) -> bool {
        self.professions.toggle_knowledge(profession, source)
    }

    pub fn toggle_decor<I, S>(&mut self, item: &str, materials: I) -> Result<bool, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.decor.toggle_track(item, materials)
    }

    pub fn set_decor_material(
        &mut self,
        item: &str,
        material: &str,
        amount: u32,
    ) -> Result<(), DomainError> {
        self.decor.set_material(item, material, amount)
    }
}

// ============================================================================
// Serde Implementation
// ============================================================================

/// Persisted shape: flat, snake_case, tolerant of missing fields and of the
/// looser shapes earlier versions wrote.
#[derive(Serialize, Deserialize)]
struct CharacterRecordWireFormat {
    name: String,
    realm: String,
    #[serde(default)]
    region: Region,
    #[serde(flatten)]
    profile: ProfileSnapshot,
    #[serde(default)]
    equipment: Vec<EquippedItem>,
    #[serde(default, deserialize_with = "persisted::timestamp")]
    equipment_last_check: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "persisted::keystones")]
    vault_mythic_plus: Option<KeystoneSummary>,
    #[serde(default, deserialize_with = "persisted::raids")]
    vault_raids: Option<RaidSummary>,
    #[serde(default)]
    vault_world: WorldSlots,
    #[serde(default, deserialize_with = "persisted::timestamp")]
    vault_last_check: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "persisted::timestamp")]
    vault_world_last_reset: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "persisted::profession_skills")]
    professions: Vec<ProfessionSkill>,
    #[serde(default, deserialize_with = "persisted::timestamp")]
    professions_last_check: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "persisted::profession_map")]
    prof_moxie: BTreeMap<Profession, u32>,
    #[serde(default, deserialize_with = "persisted::profession_map")]
    prof_concentration: BTreeMap<Profession, Concentration>,
    #[serde(default)]
    prof_spark: bool,
    #[serde(default, deserialize_with = "persisted::timestamp")]
    prof_spark_collected_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "persisted::knowledge")]
    prof_kp: BTreeMap<Profession, BTreeMap<KnowledgeSource, bool>>,
    #[serde(default, deserialize_with = "persisted::timestamp")]
    prof_kp_last_reset: Option<DateTime<Utc>>,
    #[serde(default)]
    housing_tracked: DecorTracking,
    #[serde(default = "default_activities")]
    activities: BTreeMap<String, Activity>,
    /// Missing means never checked, so the next pass resets everything.
    #[serde(default, deserialize_with = "persisted::timestamp")]
    last_reset_check: Option<DateTime<Utc>>,
}

impl Serialize for CharacterRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = CharacterRecordWireFormat {
            name: self.name.clone(),
            realm: self.realm.clone(),
            region: self.region,
            profile: self.profile.clone(),
            equipment: self.equipment.clone(),
            equipment_last_check: self.equipment_last_check,
            vault_mythic_plus: self.vault.mythic_plus.clone(),
            vault_raids: self.vault.raids.clone(),
            vault_world: self.vault.world.clone(),
            vault_last_check: self.vault.last_check,
            vault_world_last_reset: self.vault.world_last_reset,
            professions: self.professions.primaries.clone(),
            professions_last_check: self.professions.last_check,
            prof_moxie: self.professions.moxie.clone(),
            prof_concentration: self.professions.concentration.clone(),
            prof_spark: self.professions.spark,
            prof_spark_collected_at: self.professions.spark_collected_at,
            prof_kp: self.professions.knowledge.clone(),
            prof_kp_last_reset: self.professions.knowledge_last_reset,
            housing_tracked: self.decor.clone(),
            activities: self.activities.clone(),
            last_reset_check: Some(self.last_reset_check),
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CharacterRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = CharacterRecordWireFormat::deserialize(deserializer)?;
        let key = CharacterKey::new(&wire.name, &wire.realm, wire.region)
            .map_err(serde::de::Error::custom)?;

        Ok(Self {
            key,
            name: wire.name,
            realm: wire.realm,
            region: wire.region,
            profile: wire.profile,
            equipment: wire.equipment,
            equipment_last_check: wire.equipment_last_check,
            vault: VaultState {
                mythic_plus: wire.vault_mythic_plus,
                raids: wire.vault_raids,
                world: wire.vault_world,
                last_check: wire.vault_last_check,
                world_last_reset: wire.vault_world_last_reset,
            },
            professions: ProfessionState {
                primaries: wire.professions,
                last_check: wire.professions_last_check,
                moxie: wire.prof_moxie,
                concentration: wire.prof_concentration,
                spark: wire.prof_spark,
                spark_collected_at: wire.prof_spark_collected_at,
                knowledge: wire.prof_kp,
                knowledge_last_reset: wire.prof_kp_last_reset,
            },
            decor: wire.housing_tracked,
            activities: wire.activities,
            last_reset_check: wire.last_reset_check.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{KeystoneRun, VaultReward};
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
            .single()
            .expect("valid test date")
    }

    // Wednesday 2024-01-10 is a weekly reset day.
    fn thursday_noon() -> DateTime<Utc> {
        at(2024, 1, 11, 12)
    }

    fn create_test_record(now: DateTime<Utc>) -> CharacterRecord {
        let profile = ProfileSnapshot::new(80, Some(8), "Mage", "Frost", 620);
        let mut record = CharacterRecord::new("Jaina", "Kazzak", Region::Eu, profile, now)
            .expect("valid record");
        record.apply_reset_invalidation(now);
        record
    }

    fn sample_keystones() -> KeystoneSummary {
        KeystoneSummary::from_runs(vec![KeystoneRun {
            keystone_level: 10,
            dungeon: "The Stonevault".to_string(),
            is_completed_within_time: true,
            duration: 1_700_000,
        }])
    }

    mod constructor {
        use super::*;

        #[test]
        fn new_record_has_default_activities_all_available() {
            let record = create_test_record(thursday_noon());
            assert_eq!(record.activities().len(), 4);
            assert!(record
                .activities()
                .values()
                .all(|a| a.status == ActivityStatus::Available));
            assert_eq!(record.vault().world.filled(), 0);
        }

        #[test]
        fn empty_name_is_rejected() {
            let result = CharacterRecord::new(
                "",
                "Kazzak",
                Region::Eu,
                ProfileSnapshot::default(),
                thursday_noon(),
            );
            assert!(result.is_err());
        }
    }

    mod reset_invalidation {
        use super::*;

        #[test]
        fn weekly_activity_resets_after_wednesday_boundary() {
            let mut record = create_test_record(at(2024, 1, 16, 12));
            record.toggle_activity("Raid").expect("raid exists");

            // Tuesday noon to Wednesday 08:00 exactly
            let outcome = record.apply_reset_invalidation(at(2024, 1, 17, 8));
            assert!(outcome.activities_reset.contains(&"Raid".to_string()));
            assert_eq!(
                record.activities()["Raid"].status,
                ActivityStatus::Available
            );
        }

        #[test]
        fn activity_stays_completed_before_boundary() {
            let mut record = create_test_record(at(2024, 1, 16, 12));
            record.toggle_activity("Raid").expect("raid exists");

            let outcome = record.apply_reset_invalidation(at(2024, 1, 17, 7));
            assert!(!outcome.activities_reset.contains(&"Raid".to_string()));
            assert_eq!(
                record.activities()["Raid"].status,
                ActivityStatus::Completed
            );
        }

        #[test]
        fn daily_activity_resets_every_morning() {
            let mut record = create_test_record(thursday_noon());
            record.toggle_activity("World Quests").expect("exists");

            let outcome = record.apply_reset_invalidation(at(2024, 1, 12, 9));
            assert_eq!(outcome.activities_reset, vec!["World Quests".to_string()]);
            assert!(!outcome.vault_cleared);
        }

        #[test]
        fn invalidation_is_idempotent() {
            let mut record = create_test_record(thursday_noon());
            let later = at(2024, 1, 18, 9);
            assert!(record.apply_reset_invalidation(later).fired());
            let snapshot = record.clone();
            assert!(!record.apply_reset_invalidation(later).fired());
            assert_eq!(record, snapshot);
        }

        #[test]
        fn three_week_gap_clears_and_stamps_once() {
            let start = thursday_noon();
            let mut record = create_test_record(start);
            record
                .set_world_slot(0, WorldActivity::new("Delve", 8).expect("valid"))
                .expect("slot 0");
            record.store_vault(sample_keystones(), RaidSummary::default(), start);

            let later = start + Duration::weeks(3);
            let outcome = record.apply_reset_invalidation(later);
            assert!(outcome.vault_cleared);
            assert!(outcome.professions_cleared);
            assert_eq!(record.vault().world.filled(), 0);
            assert!(record.vault().mythic_plus.is_none());
            assert_eq!(record.vault().last_check, None);
            assert_eq!(record.vault().world_last_reset, Some(later));
            assert_eq!(record.last_reset_check(), later);
        }

        #[test]
        fn earlier_now_never_moves_stamp_backwards() {
            let start = thursday_noon();
            let mut record = create_test_record(start);
            let stamp = record.last_reset_check();

            record.apply_reset_invalidation(start - Duration::days(10));
            assert!(record.last_reset_check() >= stamp);
        }

        #[test]
        fn weekly_reset_clears_spark_and_knowledge() {
            let start = thursday_noon();
            let mut record = create_test_record(start);
            record.toggle_spark(start);
            record.toggle_knowledge(Profession::Alchemy, KnowledgeSource::Treatise);

            record.apply_reset_invalidation(start + Duration::weeks(1));
            assert!(!record.professions().spark);
            assert_eq!(record.professions().spark_collected_at, None);
            assert!(record.professions().knowledge[&Profession::Alchemy]
                .values()
                .all(|v| !v));
        }
    }

    mod caching {
        use super::*;

        #[test]
        fn freshness_follows_ttl() {
            let now = thursday_noon();
            let mut record = create_test_record(now);
            let ttl = Duration::seconds(300);
            assert!(!record.is_fresh(CacheField::Vault, now, ttl));

            record.store_vault(sample_keystones(), RaidSummary::default(), now);
            assert!(record.is_fresh(CacheField::Vault, now + Duration::seconds(299), ttl));
            assert!(!record.is_fresh(CacheField::Vault, now + Duration::seconds(300), ttl));
        }

        #[test]
        fn empty_equipment_is_never_fresh() {
            let now = thursday_noon();
            let mut record = create_test_record(now);
            record.store_equipment(Vec::new(), now);
            assert!(!record.is_fresh(CacheField::Equipment, now, Duration::seconds(300)));

            record.store_equipment(vec![EquippedItem::new("HEAD", "Crown", 630)], now);
            assert!(record.is_fresh(CacheField::Equipment, now, Duration::seconds(300)));
        }

        #[test]
        fn clear_vault_cache_keeps_world_slots() {
            let now = thursday_noon();
            let mut record = create_test_record(now);
            record
                .set_world_slot(3, WorldActivity::new("Delve", 2).expect("valid"))
                .expect("slot 3");
            record.store_vault(sample_keystones(), RaidSummary::default(), now);

            record.clear_vault_cache();
            assert!(record.vault().mythic_plus.is_none());
            assert_eq!(record.vault().world.filled(), 1);
        }

        #[test]
        fn replace_profile_reports_spec_change() {
            let mut record = create_test_record(thursday_noon());
            let same = ProfileSnapshot::new(80, Some(8), "Mage", "Frost", 625);
            assert_eq!(record.replace_profile(same), ProfileChange::Unchanged);
            assert_eq!(record.profile().item_level, 625);

            let fire = ProfileSnapshot::new(80, Some(8), "Mage", "Fire", 625);
            assert!(record.replace_profile(fire).spec_changed());
            assert_eq!(record.profile().spec_slug, "fire");
        }
    }

    mod user_tracking {
        use super::*;

        #[test]
        fn toggling_unknown_activity_is_rejected() {
            let mut record = create_test_record(thursday_noon());
            assert!(record.toggle_activity("Pet Battles").is_err());
        }

        #[test]
        fn world_slot_out_of_range_is_rejected() {
            let mut record = create_test_record(thursday_noon());
            let delve = WorldActivity::new("Delve", 5).expect("valid");
            assert!(record.set_world_slot(8, delve).is_err());
            assert!(record.clear_world_slot(9).is_err());
        }

        #[test]
        fn concentration_is_stamped_and_projects() {
            let now = thursday_noon();
            let mut record = create_test_record(now);
            record
                .set_concentration(Profession::Enchanting, 500, now)
                .expect("valid");
            assert_eq!(
                record.concentration_time_to_full(Profession::Enchanting, now),
                StdDuration::from_secs(172_800)
            );
            assert_eq!(
                record.concentration_time_to_full(Profession::Mining, now),
                StdDuration::ZERO
            );
            assert!(record.set_concentration(Profession::Enchanting, 1200, now).is_err());
        }

        #[test]
        fn decor_material_needs_tracked_item() {
            let mut record = create_test_record(thursday_noon());
            assert!(record.set_decor_material("501", "Oak", 2).is_err());
            assert_eq!(record.toggle_decor("501", ["Oak"]), Ok(true));
            assert!(record.set_decor_material("501", "Oak", 2).is_ok());
        }
    }

    mod serde {
        use super::*;

        #[test]
        fn serialize_deserialize_roundtrip() {
            let now = thursday_noon();
            let mut record = create_test_record(now);
            record.store_vault(sample_keystones(), RaidSummary::default(), now);
            record.store_equipment(vec![EquippedItem::new("HEAD", "Crown", 630)], now);
            record
                .set_concentration(Profession::Alchemy, 300, now)
                .expect("valid");
            record.set_moxie(Profession::Alchemy, 45);
            record.toggle_spark(now);
            record
                .set_world_slot(1, WorldActivity::new("Delve", 8).expect("valid"))
                .expect("slot 1");

            let json = serde_json::to_string(&record).expect("serialize");
            let restored: CharacterRecord = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(restored, record);
        }

        #[test]
        fn timestamps_persist_as_rfc3339() {
            let now = thursday_noon();
            let record = create_test_record(now);
            let value = serde_json::to_value(&record).expect("serialize");
            assert_eq!(value["last_reset_check"], "2024-01-11T12:00:00Z");
            assert_eq!(value["equipment_last_check"], serde_json::Value::Null);
        }

        #[test]
        fn minimal_record_loads_with_defaults() {
            let json = r#"{
                "name": "Thrall",
                "realm": "Draenor",
                "level": 80,
                "vault_world": [{"type": "Delve", "tier": 3}, "junk"]
            }"#;
            let record: CharacterRecord = serde_json::from_str(json).expect("deserialize");
            assert_eq!(record.region(), Region::Eu);
            assert_eq!(record.profile().level, 80);
            assert_eq!(record.activities().len(), 4);
            assert_eq!(record.vault().world.filled(), 1);
            assert_eq!(record.vault().world.as_slice().len(), 8);
            assert_eq!(
                record.vault().mythic_plus.as_ref().map(|m| m.vault_rewards[0]),
                None::<VaultReward>
            );
        }

        #[test]
        fn earlier_engine_shapes_load() {
            let json = r#"{
                "name": "Jaina",
                "level": "?",
                "realm": "Kazzak",
                "region": "eu",
                "portrait_url": null,
                "class_id": 8,
                "class_name": "Mage",
                "spec_name": "Frost",
                "item_level": 620,
                "equipment": [],
                "equipment_last_check": null,
                "vault_mythic_plus": {
                    "best_runs": [{
                        "keystone_level": 7,
                        "dungeon": "Ara-Kara",
                        "is_completed_within_time": true,
                        "duration": 1800000
                    }],
                    "vault_rewards": {"1": {"ilvl": 269, "from_level": 7, "unlocked": true}},
                    "keystone_ilvl_map": {"2": 259}
                },
                "vault_raids": {},
                "vault_world": [null, {"type": "Delve", "tier": 8}],
                "vault_last_check": "2024-01-11T12:00:00.000000+00:00",
                "vault_world_last_reset": "2024-01-11T12:00:00+00:00",
                "professions": {"primaries": [
                    {"id": 171, "name": "Alchemy", "icon_url": null, "skill": 40, "max_skill": 100}
                ]},
                "professions_last_check": null,
                "prof_moxie": {"Khaz Algar Alchemy": 3, "Archaeology": 9},
                "prof_concentration": {
                    "Alchemy": {"current": 200, "updated_at": "2024-01-11T12:00:00+00:00"}
                },
                "prof_spark": true,
                "prof_spark_collected_at": "2024-01-11T12:00:00.000000+00:00",
                "prof_kp": {"Khaz Algar Alchemy": {"Treatise": true, "Dailies": true}},
                "prof_kp_last_reset": null,
                "housing_tracked": {"1204": {"Oak": 2}},
                "activities": {
                    "Raid": {"status": "completed", "reset": "weekly"},
                    "World Quests": {"status": "available", "reset": "daily"}
                },
                "last_reset_check": "2024-01-11T12:00:00.000000+00:00"
            }"#;
            let record: CharacterRecord = serde_json::from_str(json).expect("deserialize");

            assert_eq!(record.profile().level, 0);
            assert_eq!(
                record.vault().mythic_plus.as_ref().map(|m| m.vault_rewards[0].reward),
                Some(269)
            );
            assert!(record.vault().raids.is_none());
            assert_eq!(record.vault().world.get(1).map(|a| a.tier), Some(8));
            assert_eq!(record.professions().primaries.len(), 1);
            assert_eq!(
                record.professions().moxie.get(&Profession::Alchemy),
                Some(&3)
            );
            assert_eq!(record.professions().moxie.len(), 1);
            let knowledge = &record.professions().knowledge[&Profession::Alchemy];
            assert_eq!(knowledge.get(&KnowledgeSource::Treatise), Some(&true));
            assert_eq!(knowledge.len(), 1);
            assert_eq!(
                record.professions().spark_collected_at,
                Some(thursday_noon())
            );
            assert_eq!(
                record.activities()["Raid"].status,
                ActivityStatus::Completed
            );
            assert_eq!(record.last_reset_check(), thursday_noon());
        }

        #[test]
        fn empty_object_caches_read_as_never_fetched() {
            let json = r#"{
                "name": "Thrall",
                "realm": "Draenor",
                "vault_mythic_plus": {},
                "vault_raids": {"kills_this_week": [
                    {"boss": "Vexie", "raid": "Undermine", "difficulty": "Heroic"}
                ], "total_kills": 1, "difficulty_breakdown": {"Heroic": 1}},
                "professions": {}
            }"#;
            let record: CharacterRecord = serde_json::from_str(json).expect("deserialize");
            assert!(record.vault().mythic_plus.is_none());
            assert_eq!(
                record.vault().raids.as_ref().map(|r| r.total_kills()),
                Some(1)
            );
            assert!(record.professions().primaries.is_empty());
        }

        #[test]
        fn record_with_empty_name_fails_to_load() {
            let json = r#"{"name": "", "realm": "Draenor"}"#;
            assert!(serde_json::from_str::<CharacterRecord>(json).is_err());
        }
    }
}
