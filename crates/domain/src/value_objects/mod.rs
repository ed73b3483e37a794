//! Value objects - immutable data defined by their attributes
//!
//! Everything here is plain data plus pure derivations; the `CharacterRecord`
//! aggregate owns instances and decides when they change.

mod activity;
mod equipment;
mod housing;
mod professions;
mod profile;
mod vault;

pub use activity::{default_activities, Activity, ActivityStatus};
pub use equipment::EquippedItem;
pub use housing::DecorTracking;
pub use professions::{
    empty_knowledge, projected, time_to_full, Concentration, KnowledgeSource, Profession,
    ProfessionSkill, ProfessionState, CONCENTRATION_CAP, CONCENTRATION_FILL_SECS,
};
pub use profile::{class_slug, spec_slug, ProfileSnapshot};
pub use vault::{
    keystone_rewards, KeystoneRun, KeystoneSummary, RaidDifficulty, RaidEncounterKill, RaidKill,
    RaidSummary, RaidVaultReward, VaultReward, VaultState, WorldActivity, WorldSlots,
    KEYSTONE_SLOT_RUNS, MAX_BEST_RUNS, RAID_SLOT_KILLS, WORLD_SLOT_COUNT,
};
