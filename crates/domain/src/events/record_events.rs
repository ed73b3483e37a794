//! Outcomes of `CharacterRecord` mutations.

use crate::value_objects::ActivityStatus;

/// Which reset groups fired during one invalidation pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResetOutcome {
    /// Activities whose cadence boundary had passed, now available again.
    pub activities_reset: Vec<String>,
    /// World slots and fetched vault data were cleared.
    pub vault_cleared: bool,
    /// Spark and weekly knowledge flags were cleared.
    pub professions_cleared: bool,
}

impl ResetOutcome {
    /// True when anything changed and the record should be saved.
    pub fn fired(&self) -> bool {
        !self.activities_reset.is_empty() || self.vault_cleared || self.professions_cleared
    }
}

/// Outcome of overwriting the profile snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileChange {
    SpecChanged { from: String, to: String },
    Unchanged,
}

impl ProfileChange {
    pub fn spec_changed(&self) -> bool {
        matches!(self, Self::SpecChanged { .. })
    }
}

/// Outcome of toggling a tracked activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityToggled {
    pub activity: String,
    pub status: ActivityStatus,
}
