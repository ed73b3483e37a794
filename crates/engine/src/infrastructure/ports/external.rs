//! Character data provider port.

use async_trait::async_trait;
use innkeeper_domain::value_objects::{
    EquippedItem, KeystoneRun, ProfessionSkill, ProfileSnapshot, RaidEncounterKill,
};
use innkeeper_domain::Region;
use serde::Serialize;

use super::error::FetchError;

// =============================================================================
// Provider Types
// =============================================================================

/// Where a character lives on the provider.
///
/// Carries the user's spelling; the provider does its own slugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterLocator {
    pub region: Region,
    pub realm: String,
    pub name: String,
}

impl CharacterLocator {
    pub fn new(region: Region, realm: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            region,
            realm: realm.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for CharacterLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.region, self.realm, self.name)
    }
}

/// Profile as reported by the provider, with the provider's spelling of the
/// name and realm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteProfile {
    pub name: String,
    pub realm: String,
    pub region: Region,
    pub profile: ProfileSnapshot,
}

/// A realm that characters can be added from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RealmInfo {
    pub name: String,
    pub slug: String,
}

// =============================================================================
// Provider Port
// =============================================================================

/// Remote source of character data.
///
/// `FetchError::NotFound` is the absence signal; every other error means the
/// provider could not answer right now.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CharacterDataPort: Send + Sync {
    async fn fetch_profile(&self, who: &CharacterLocator) -> Result<RemoteProfile, FetchError>;

    async fn fetch_equipment(
        &self,
        who: &CharacterLocator,
    ) -> Result<Vec<EquippedItem>, FetchError>;

    /// Best keystone runs of the current weekly period, in provider order.
    async fn fetch_vault_keystones(
        &self,
        who: &CharacterLocator,
    ) -> Result<Vec<KeystoneRun>, FetchError>;

    /// Raid encounter kills with their last-kill timestamps, unfiltered.
    async fn fetch_vault_raids(
        &self,
        who: &CharacterLocator,
    ) -> Result<Vec<RaidEncounterKill>, FetchError>;

    async fn fetch_professions(
        &self,
        who: &CharacterLocator,
    ) -> Result<Vec<ProfessionSkill>, FetchError>;

    async fn fetch_realms(&self, region: Region) -> Result<Vec<RealmInfo>, FetchError>;

    /// Scans every realm of `region` for a character called `name`.
    ///
    /// Only one scan runs at a time on the provider; a second one is `Busy`.
    async fn auto_add(&self, region: Region, name: &str) -> Result<RemoteProfile, FetchError>;

    /// Talent tree of one specialization, passed through as the provider sent it.
    async fn fetch_talent_tree(
        &self,
        region: Region,
        class_slug: &str,
        spec_slug: &str,
    ) -> Result<serde_json::Value, FetchError>;
}
