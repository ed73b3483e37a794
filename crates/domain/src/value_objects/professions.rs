//! Crafting state: profession skills, concentration, moxie, and weekly knowledge.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Concentration cap for every profession.
pub const CONCENTRATION_CAP: u32 = 1000;

/// Time to regenerate from zero to the cap.
pub const CONCENTRATION_FILL_SECS: u64 = 4 * 24 * 60 * 60;

// =============================================================================
// Profession
// =============================================================================

/// Professions the provider reports, primaries plus cooking and fishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Profession {
    Alchemy,
    Blacksmithing,
    Enchanting,
    Engineering,
    Herbalism,
    Inscription,
    Jewelcrafting,
    Leatherworking,
    Mining,
    Skinning,
    Tailoring,
    Cooking,
    Fishing,
}

impl Profession {
    pub const ALL: [Profession; 13] = [
        Self::Alchemy,
        Self::Blacksmithing,
        Self::Enchanting,
        Self::Engineering,
        Self::Herbalism,
        Self::Inscription,
        Self::Jewelcrafting,
        Self::Leatherworking,
        Self::Mining,
        Self::Skinning,
        Self::Tailoring,
        Self::Cooking,
        Self::Fishing,
    ];

    /// Provider profession id.
    pub fn id(&self) -> u32 {
        match self {
            Self::Alchemy => 171,
            Self::Blacksmithing => 164,
            Self::Enchanting => 333,
            Self::Engineering => 202,
            Self::Herbalism => 182,
            Self::Inscription => 773,
            Self::Jewelcrafting => 755,
            Self::Leatherworking => 165,
            Self::Mining => 186,
            Self::Skinning => 393,
            Self::Tailoring => 197,
            Self::Cooking => 185,
            Self::Fishing => 356,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }

    /// Matches a bare or expansion-qualified label ("Khaz Algar Alchemy").
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        label.parse().ok().or_else(|| {
            let last = label.rsplit(char::is_whitespace).next()?;
            last.parse().ok()
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Alchemy => "Alchemy",
            Self::Blacksmithing => "Blacksmithing",
            Self::Enchanting => "Enchanting",
            Self::Engineering => "Engineering",
            Self::Herbalism => "Herbalism",
            Self::Inscription => "Inscription",
            Self::Jewelcrafting => "Jewelcrafting",
            Self::Leatherworking => "Leatherworking",
            Self::Mining => "Mining",
            Self::Skinning => "Skinning",
            Self::Tailoring => "Tailoring",
            Self::Cooking => "Cooking",
            Self::Fishing => "Fishing",
        }
    }
}

impl fmt::Display for Profession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Profession {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DomainError::parse(format!("Unknown profession: {}", wanted)))
    }
}

// =============================================================================
// Knowledge Sources
// =============================================================================

/// Weekly knowledge-point sources, each collectable once per week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KnowledgeSource {
    #[serde(rename = "Weekly Quest")]
    WeeklyQuest,
    Treatise,
    #[serde(rename = "Moxie Order")]
    MoxieOrder,
    #[serde(rename = "Field Notes")]
    FieldNotes,
    #[serde(rename = "Weekly Treasures")]
    WeeklyTreasures,
    Notebook,
}

impl KnowledgeSource {
    pub const ALL: [KnowledgeSource; 6] = [
        Self::WeeklyQuest,
        Self::Treatise,
        Self::MoxieOrder,
        Self::FieldNotes,
        Self::WeeklyTreasures,
        Self::Notebook,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::WeeklyQuest => "Weekly Quest",
            Self::Treatise => "Treatise",
            Self::MoxieOrder => "Moxie Order",
            Self::FieldNotes => "Field Notes",
            Self::WeeklyTreasures => "Weekly Treasures",
            Self::Notebook => "Notebook",
        }
    }
}

impl fmt::Display for KnowledgeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for KnowledgeSource {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|source| source.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DomainError::parse(format!("Unknown knowledge source: {}", wanted)))
    }
}

/// Fresh per-profession knowledge map with every source uncollected.
pub fn empty_knowledge() -> BTreeMap<KnowledgeSource, bool> {
    KnowledgeSource::ALL.into_iter().map(|s| (s, false)).collect()
}

// =============================================================================
// Skills
// =============================================================================

/// Skill in the current expansion tier of one profession.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessionSkill {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub icon_url: Option<String>,
    pub skill: u32,
    pub max_skill: u32,
}

// =============================================================================
// Concentration
// =============================================================================

/// Concentration as last entered by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concentration {
    pub current: u32,
    #[serde(default, deserialize_with = "crate::persisted::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn projected_value(current: u32, last_update: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let cap = f64::from(CONCENTRATION_CAP);
    let elapsed = (now - last_update).num_milliseconds().max(0) as f64 / 1000.0;
    let regenerated = elapsed * cap / CONCENTRATION_FILL_SECS as f64;
    (f64::from(current) + regenerated).min(cap)
}

/// Concentration regenerated up to `now`, capped.
///
/// Without a recorded update there is no regeneration to account for.
pub fn projected(current: u32, last_update: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u32 {
    match last_update {
        Some(at) => projected_value(current, at, now).floor() as u32,
        None => current.min(CONCENTRATION_CAP),
    }
}

/// Time until concentration reaches the cap, zero if unknown or already full.
///
/// ```
/// use chrono::{Duration, Utc};
/// use innkeeper_domain::value_objects::time_to_full;
///
/// let now = Utc::now();
/// let left = time_to_full(500, Some(now), now);
/// assert_eq!(left.as_secs(), 2 * 24 * 60 * 60);
/// assert!(time_to_full(500, None, now).is_zero());
/// assert!(time_to_full(0, Some(now - Duration::days(5)), now).is_zero());
/// ```
pub fn time_to_full(
    current: u32,
    last_update: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Duration {
    let Some(at) = last_update else {
        return Duration::ZERO;
    };
    let effective = projected_value(current, at, now);
    let cap = f64::from(CONCENTRATION_CAP);
    if effective >= cap {
        return Duration::ZERO;
    }
    Duration::from_secs_f64((cap - effective) * CONCENTRATION_FILL_SECS as f64 / cap)
}

impl Concentration {
    pub fn new(current: u32, updated_at: DateTime<Utc>) -> Result<Self, DomainError> {
        if current > CONCENTRATION_CAP {
            return Err(DomainError::validation(format!(
                "Concentration cannot exceed {}, got {}",
                CONCENTRATION_CAP, current
            )));
        }
        Ok(Self {
            current,
            updated_at: Some(updated_at),
        })
    }

    pub fn time_to_full(&self, now: DateTime<Utc>) -> Duration {
        time_to_full(self.current, self.updated_at, now)
    }

    pub fn projected(&self, now: DateTime<Utc>) -> u32 {
        projected(self.current, self.updated_at, now)
    }
}

// =============================================================================
// Profession State
// =============================================================================

/// Everything the record caches or tracks about crafting.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfessionState {
    pub primaries: Vec<ProfessionSkill>,
    pub last_check: Option<DateTime<Utc>>,
    pub moxie: BTreeMap<Profession, u32>,
    pub concentration: BTreeMap<Profession, Concentration>,
    pub spark: bool,
    pub spark_collected_at: Option<DateTime<Utc>>,
    pub knowledge: BTreeMap<Profession, BTreeMap<KnowledgeSource, bool>>,
    pub knowledge_last_reset: Option<DateTime<Utc>>,
}

impl ProfessionState {
    pub fn toggle_spark(&mut self, now: DateTime<Utc>) -> bool {
        self.spark = !self.spark;
        self.spark_collected_at = self.spark.then_some(now);
        self.spark
    }

    /// Flips one knowledge source, creating the profession's map on first use.
    pub fn toggle_knowledge(&mut self, profession: Profession, source: KnowledgeSource) -> bool {
        let sources = self.knowledge.entry(profession).or_insert_with(empty_knowledge);
        let flag = sources.entry(source).or_insert(false);
        *flag = !*flag;
        *flag
    }

    /// Weekly clear of the spark and every knowledge flag.
    pub fn reset_weekly(&mut self, now: DateTime<Utc>) {
        self.spark = false;
        self.spark_collected_at = None;
        for sources in self.knowledge.values_mut() {
            for flag in sources.values_mut() {
                *flag = false;
            }
        }
        self.knowledge_last_reset = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 11, 12, 0, 0)
            .single()
            .expect("valid test date")
    }

    #[test]
    fn profession_ids_round_trip() {
        for profession in Profession::ALL {
            assert_eq!(Profession::from_id(profession.id()), Some(profession));
        }
        assert_eq!(Profession::from_id(1), None);
        assert_eq!("alchemy".parse::<Profession>(), Ok(Profession::Alchemy));
    }

    #[test]
    fn expansion_qualified_labels_resolve() {
        assert_eq!(
            Profession::from_label("Khaz Algar Alchemy"),
            Some(Profession::Alchemy)
        );
        assert_eq!(Profession::from_label(" mining "), Some(Profession::Mining));
        assert_eq!(Profession::from_label("Archaeology"), None);
        assert_eq!(Profession::from_label(""), None);
    }

    #[test]
    fn knowledge_source_parse_rejects_unknown_names() {
        assert_eq!(
            "Field Notes".parse::<KnowledgeSource>(),
            Ok(KnowledgeSource::FieldNotes)
        );
        assert!("Dailies".parse::<KnowledgeSource>().is_err());
    }

    #[test]
    fn knowledge_source_serializes_with_display_name() {
        let json = serde_json::to_value(KnowledgeSource::WeeklyTreasures).expect("serialize");
        assert_eq!(json, serde_json::json!("Weekly Treasures"));
    }

    #[test]
    fn time_to_full_from_half_is_two_days() {
        let now = noon();
        assert_eq!(time_to_full(500, Some(now), now).as_secs(), 172_800);
    }

    #[test]
    fn regeneration_since_update_is_counted() {
        let now = noon();
        let a_day_ago = now - chrono::Duration::days(1);
        // 500 + 250 regenerated, 250 left at a quarter of the cap per day.
        assert_eq!(projected(500, Some(a_day_ago), now), 750);
        assert_eq!(time_to_full(500, Some(a_day_ago), now).as_secs(), 86_400);
    }

    #[test]
    fn empty_two_days_ago_is_half_full_with_two_days_left() {
        let now = noon();
        let two_days_ago = now - chrono::Duration::days(2);
        assert_eq!(projected(0, Some(two_days_ago), now), 500);
        assert_eq!(
            time_to_full(0, Some(two_days_ago), now),
            Duration::from_secs(172_800)
        );

        let concentration = Concentration {
            current: 0,
            updated_at: Some(two_days_ago),
        };
        assert_eq!(concentration.projected(now), 500);
        assert_eq!(concentration.time_to_full(now).as_secs(), 2 * 24 * 60 * 60);
    }

    #[test]
    fn legacy_concentration_timestamps_are_read() {
        let json = r#"{"current": 250, "updated_at": "2024-01-11T12:00:00.000000+00:00"}"#;
        let concentration: Concentration = serde_json::from_str(json).expect("deserialize");
        assert_eq!(concentration.updated_at, Some(noon()));

        let json = r#"{"current": 250}"#;
        let unstamped: Concentration = serde_json::from_str(json).expect("deserialize");
        assert_eq!(unstamped.updated_at, None);
    }

    #[test]
    fn full_or_unknown_concentration_needs_no_time() {
        let now = noon();
        assert!(time_to_full(1000, Some(now), now).is_zero());
        assert!(time_to_full(10, None, now).is_zero());
        assert_eq!(projected(10, None, now), 10);
    }

    #[test]
    fn concentration_rejects_values_over_cap() {
        assert!(Concentration::new(1001, noon()).is_err());
        assert!(Concentration::new(1000, noon()).is_ok());
    }

    #[test]
    fn first_knowledge_toggle_initialises_all_sources() {
        let mut state = ProfessionState::default();
        assert!(state.toggle_knowledge(Profession::Mining, KnowledgeSource::Treatise));
        let sources = &state.knowledge[&Profession::Mining];
        assert_eq!(sources.len(), KnowledgeSource::ALL.len());
        assert_eq!(sources.values().filter(|v| **v).count(), 1);
        assert!(!state.toggle_knowledge(Profession::Mining, KnowledgeSource::Treatise));
    }

    #[test]
    fn spark_toggle_stamps_and_clears() {
        let mut state = ProfessionState::default();
        assert!(state.toggle_spark(noon()));
        assert_eq!(state.spark_collected_at, Some(noon()));
        assert!(!state.toggle_spark(noon()));
        assert_eq!(state.spark_collected_at, None);
    }

    #[test]
    fn weekly_reset_clears_flags_but_keeps_profession_keys() {
        let mut state = ProfessionState::default();
        state.toggle_knowledge(Profession::Tailoring, KnowledgeSource::Notebook);
        state.toggle_spark(noon());
        state.reset_weekly(noon());
        assert!(!state.spark);
        assert!(state.knowledge[&Profession::Tailoring].values().all(|v| !v));
        assert_eq!(state.knowledge_last_reset, Some(noon()));
    }
}
