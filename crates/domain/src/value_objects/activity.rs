//! Tracked activities with daily or weekly reset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::reset_clock::ResetCadence;

/// Completion status of a tracked activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    #[default]
    Available,
    Completed,
}

impl ActivityStatus {
    /// Returns the opposite status.
    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            Self::Available => Self::Completed,
            Self::Completed => Self::Available,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Completed => "completed",
        }
    }
}

/// A tracked activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub status: ActivityStatus,
    #[serde(rename = "reset")]
    pub cadence: ResetCadence,
}

impl Activity {
    pub fn available(cadence: ResetCadence) -> Self {
        Self {
            status: ActivityStatus::Available,
            cadence,
        }
    }
}

/// Activities every new character starts with.
pub fn default_activities() -> BTreeMap<String, Activity> {
    [
        ("Raid", ResetCadence::Weekly),
        ("Mythic+", ResetCadence::Weekly),
        ("Expeditions", ResetCadence::Weekly),
        ("World Quests", ResetCadence::Daily),
    ]
    .into_iter()
    .map(|(name, cadence)| (name.to_string(), Activity::available(cadence)))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_round_trips() {
        assert_eq!(
            ActivityStatus::Available.toggled(),
            ActivityStatus::Completed
        );
        assert_eq!(
            ActivityStatus::Completed.toggled(),
            ActivityStatus::Available
        );
    }

    #[test]
    fn defaults_have_one_daily_entry() {
        let defaults = default_activities();
        assert_eq!(defaults.len(), 4);
        let daily: Vec<_> = defaults
            .iter()
            .filter(|(_, a)| a.cadence == ResetCadence::Daily)
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(daily, vec!["World Quests"]);
        assert!(defaults.values().all(|a| a.status == ActivityStatus::Available));
    }

    #[test]
    fn activity_serializes_cadence_as_reset() {
        let json = serde_json::to_value(Activity::available(ResetCadence::Weekly))
            .expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"status": "available", "reset": "weekly"})
        );
    }
}
