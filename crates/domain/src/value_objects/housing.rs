//! Decor items the user is gathering materials for.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Tracked decor items, each with a count per material.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecorTracking(BTreeMap<String, BTreeMap<String, u32>>);

impl DecorTracking {
    /// Starts tracking `item` with zeroed `materials`, or stops if already tracked.
    ///
    /// Returns whether the item is tracked afterwards.
    pub fn toggle_track<I, S>(&mut self, item: &str, materials: I) -> Result<bool, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let item = item.trim();
        if item.is_empty() {
            return Err(DomainError::validation("Decor item id cannot be empty"));
        }
        if self.0.remove(item).is_some() {
            return Ok(false);
        }
        let counts = materials
            .into_iter()
            .map(|m| m.as_ref().trim().to_string())
            .filter(|m| !m.is_empty())
            .map(|m| (m, 0))
            .collect();
        self.0.insert(item.to_string(), counts);
        Ok(true)
    }

    /// Records how much of `material` is on hand for a tracked item.
    pub fn set_material(
        &mut self,
        item: &str,
        material: &str,
        amount: u32,
    ) -> Result<(), DomainError> {
        let counts = self
            .0
            .get_mut(item.trim())
            .ok_or_else(|| DomainError::not_found("DecorItem", item.trim()))?;
        counts.insert(material.trim().to_string(), amount);
        Ok(())
    }

    pub fn materials(&self, item: &str) -> Option<&BTreeMap<String, u32>> {
        self.0.get(item.trim())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
