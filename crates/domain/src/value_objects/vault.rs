//! Weekly vault: keystone runs, raid kills, and world activity slots.
//!
//! Reward slots are always derived from the raw runs and kills held next to
//! them, so a summary built from the same inputs is identical every time.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DomainError;
use crate::reset_clock::weekly_boundary;
use crate::reward_tables::{self, WORLD_MAX_TIER};

/// Number of best runs kept from the provider.
pub const MAX_BEST_RUNS: usize = 8;

/// Run positions (0-based, best first) that unlock keystone vault slots 1-3.
pub const KEYSTONE_SLOT_RUNS: [usize; 3] = [0, 3, 7];

/// Kill positions (0-based, best first) that unlock raid vault slots 1-3.
pub const RAID_SLOT_KILLS: [usize; 3] = [1, 3, 5];

/// Fixed number of world activity slots.
pub const WORLD_SLOT_COUNT: usize = 8;

// =============================================================================
// Raid Difficulty
// =============================================================================

/// Raid difficulty, ordered from lowest to highest rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RaidDifficulty {
    #[serde(rename = "LFR")]
    Lfr,
    Normal,
    Heroic,
    Mythic,
}

impl RaidDifficulty {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Lfr => "LFR",
            Self::Normal => "Normal",
            Self::Heroic => "Heroic",
            Self::Mythic => "Mythic",
        }
    }

    pub fn short_label(&self) -> &'static str {
        match self {
            Self::Lfr => "L",
            Self::Normal => "N",
            Self::Heroic => "H",
            Self::Mythic => "M",
        }
    }

    /// Maps a provider difficulty name, treating anything unrecognised as Normal.
    pub fn from_provider_label(label: &str) -> Self {
        label.parse().unwrap_or(Self::Normal)
    }
}

impl fmt::Display for RaidDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RaidDifficulty {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lfr" | "raid finder" => Ok(Self::Lfr),
            "normal" => Ok(Self::Normal),
            "heroic" => Ok(Self::Heroic),
            "mythic" => Ok(Self::Mythic),
            other => Err(DomainError::parse(format!("Unknown raid difficulty: {}", other))),
        }
    }
}

// =============================================================================
// Keystones
// =============================================================================

/// One timed or untimed keystone dungeon run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoneRun {
    pub keystone_level: u32,
    pub dungeon: String,
    pub is_completed_within_time: bool,
    /// Run duration in milliseconds.
    pub duration: u64,
}

/// One keystone vault reward slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VaultReward {
    #[serde(rename = "ilvl")]
    pub reward: u32,
    pub from_level: u32,
    pub unlocked: bool,
}

impl VaultReward {
    pub fn locked() -> Self {
        Self::default()
    }
}

/// Derives the three keystone reward slots from runs sorted best first.
///
/// Only the run at each slot position counts; a slot is unlocked whenever a
/// run exists there, whatever its depth.
pub fn keystone_rewards(best_runs: &[KeystoneRun]) -> [VaultReward; 3] {
    KEYSTONE_SLOT_RUNS.map(|idx| match best_runs.get(idx) {
        Some(run) => VaultReward {
            reward: reward_tables::keystone_reward(run.keystone_level, 0),
            from_level: run.keystone_level,
            unlocked: true,
        },
        None => VaultReward::locked(),
    })
}

/// Keystone part of the vault cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct KeystoneSummary {
    pub best_runs: Vec<KeystoneRun>,
    pub vault_rewards: [VaultReward; 3],
}

impl KeystoneSummary {
    /// Sorts runs by descending depth (ties keep fetch order), keeps the best
    /// eight and derives the reward slots.
    pub fn from_runs(mut runs: Vec<KeystoneRun>) -> Self {
        runs.sort_by(|a, b| b.keystone_level.cmp(&a.keystone_level));
        runs.truncate(MAX_BEST_RUNS);
        let vault_rewards = keystone_rewards(&runs);
        Self {
            best_runs: runs,
            vault_rewards,
        }
    }
}

// =============================================================================
// Raids
// =============================================================================

/// A boss kill as reported by the provider, before weekly filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidEncounterKill {
    pub boss: String,
    pub raid: String,
    pub difficulty: RaidDifficulty,
    pub last_kill: DateTime<Utc>,
}

/// A boss counted toward this week's vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidKill {
    pub boss: String,
    pub raid: String,
    pub difficulty: RaidDifficulty,
}

impl From<&RaidEncounterKill> for RaidKill {
    fn from(kill: &RaidEncounterKill) -> Self {
        Self {
            boss: kill.boss.clone(),
            raid: kill.raid.clone(),
            difficulty: kill.difficulty,
        }
    }
}

/// One raid vault reward slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RaidVaultReward {
    #[serde(rename = "ilvl")]
    pub reward: u32,
    pub difficulty: Option<RaidDifficulty>,
    pub unlocked: bool,
}

/// Raid part of the vault cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RaidSummary {
    pub kills_this_week: Vec<RaidKill>,
    pub difficulty_breakdown: BTreeMap<RaidDifficulty, u32>,
    pub vault_rewards: [RaidVaultReward; 3],
}

impl RaidSummary {
    /// Keeps kills since the current weekly reset, one per boss at its
    /// highest difficulty, ordered hardest first.
    pub fn from_encounters(encounters: &[RaidEncounterKill], now: DateTime<Utc>) -> Self {
        let reset = weekly_boundary(now);
        let mut kills: Vec<RaidKill> = Vec::new();

        for encounter in encounters.iter().filter(|e| e.last_kill >= reset) {
            match kills.iter_mut().find(|k| k.boss == encounter.boss) {
                Some(existing) if encounter.difficulty > existing.difficulty => {
                    *existing = RaidKill::from(encounter);
                }
                Some(_) => {}
                None => kills.push(RaidKill::from(encounter)),
            }
        }
        Self::from_kills(kills)
    }

    /// Orders already-filtered weekly kills hardest first and derives the
    /// breakdown and reward slots from them.
    pub fn from_kills(mut kills: Vec<RaidKill>) -> Self {
        kills.sort_by(|a, b| b.difficulty.cmp(&a.difficulty));

        let mut difficulty_breakdown = BTreeMap::new();
        for kill in &kills {
            *difficulty_breakdown.entry(kill.difficulty).or_insert(0) += 1;
        }

        let vault_rewards = RAID_SLOT_KILLS.map(|idx| match kills.get(idx) {
            Some(kill) => RaidVaultReward {
                reward: reward_tables::raid_reward(kill.difficulty),
                difficulty: Some(kill.difficulty),
                unlocked: true,
            },
            None => RaidVaultReward::default(),
        });

        Self {
            kills_this_week: kills,
            difficulty_breakdown,
            vault_rewards,
        }
    }

    pub fn total_kills(&self) -> usize {
        self.kills_this_week.len()
    }
}

// =============================================================================
// World Activities
// =============================================================================

/// A user-reported world activity occupying one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldActivity {
    #[serde(rename = "type")]
    pub activity_type: String,
    pub tier: u8,
}

impl WorldActivity {
    /// Builds an activity, rejecting empty types and tiers outside 1..=11.
    pub fn new(activity_type: impl Into<String>, tier: u8) -> Result<Self, DomainError> {
        let activity_type = activity_type.into();
        if activity_type.trim().is_empty() {
            return Err(DomainError::validation("World activity type cannot be empty"));
        }
        if !(1..=WORLD_MAX_TIER).contains(&tier) {
            return Err(DomainError::validation(format!(
                "World activity tier must be between 1 and {}, got {}",
                WORLD_MAX_TIER, tier
            )));
        }
        Ok(Self {
            activity_type,
            tier,
        })
    }

    pub fn reward(&self) -> u32 {
        reward_tables::world_reward(self.tier, 0)
    }
}

/// Exactly eight world activity slots; absent means not reported this week.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct WorldSlots([Option<WorldActivity>; WORLD_SLOT_COUNT]);

impl WorldSlots {
    fn check_index(slot: usize) -> Result<(), DomainError> {
        if slot >= WORLD_SLOT_COUNT {
            return Err(DomainError::validation(format!(
                "World slot must be between 0 and {}, got {}",
                WORLD_SLOT_COUNT - 1,
                slot
            )));
        }
        Ok(())
    }

    pub fn get(&self, slot: usize) -> Option<&WorldActivity> {
        self.0.get(slot).and_then(Option::as_ref)
    }

    pub fn set(&mut self, slot: usize, activity: WorldActivity) -> Result<(), DomainError> {
        Self::check_index(slot)?;
        self.0[slot] = Some(activity);
        Ok(())
    }

    pub fn clear(&mut self, slot: usize) -> Result<(), DomainError> {
        Self::check_index(slot)?;
        self.0[slot] = None;
        Ok(())
    }

    pub fn clear_all(&mut self) {
        self.0 = Default::default();
    }

    pub fn as_slice(&self) -> &[Option<WorldActivity>] {
        &self.0
    }

    pub fn filled(&self) -> usize {
        self.0.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.filled() == 0
    }
}

/// Persisted slot entry: anything that is not an activity object reads as empty.
#[derive(Deserialize)]
#[serde(untagged)]
enum PersistedSlot {
    Activity(WorldActivity),
    Other(IgnoredAny),
}

impl<'de> Deserialize<'de> for WorldSlots {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let persisted: Vec<PersistedSlot> = Vec::deserialize(deserializer)?;
        let mut slots = WorldSlots::default();
        for (slot, entry) in slots.0.iter_mut().zip(persisted) {
            if let PersistedSlot::Activity(activity) = entry {
                *slot = Some(activity);
            }
        }
        Ok(slots)
    }
}

// =============================================================================
// Vault State
// =============================================================================

/// Everything the record caches about the weekly vault.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VaultState {
    pub mythic_plus: Option<KeystoneSummary>,
    pub raids: Option<RaidSummary>,
    pub world: WorldSlots,
    pub last_check: Option<DateTime<Utc>>,
    pub world_last_reset: Option<DateTime<Utc>>,
}

impl VaultState {
    /// Drops fetched keystone and raid data so the next read refetches.
    pub fn clear_fetched(&mut self) {
        self.mythic_plus = None;
        self.raids = None;
        self.last_check = None;
    }
}
