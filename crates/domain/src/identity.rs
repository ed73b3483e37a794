//! Character identity: name, realm and region.
//!
//! Names and realms arrive from users and from the provider in different
//! Unicode forms ("Ænïma" typed with combining marks vs. precomposed) and
//! casings. Identity comparison folds both to NFC lowercase.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::error::DomainError;

/// Provider region a character lives in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Us,
    #[default]
    Eu,
    Kr,
    Tw,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Eu => "eu",
            Region::Kr => "kr",
            Region::Tw => "tw",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "us" => Ok(Region::Us),
            "eu" => Ok(Region::Eu),
            "kr" => Ok(Region::Kr),
            "tw" => Ok(Region::Tw),
            other => Err(DomainError::parse(format!("Unknown region: {}", other))),
        }
    }
}

/// Folds a name or realm for identity comparison (NFC, then lowercase).
pub fn fold_identity(raw: &str) -> String {
    let nfc: String = raw.trim().nfc().collect();
    nfc.to_lowercase()
}

/// Normalized lookup key for a character.
///
/// Two keys are equal when their folded name, folded realm and region match.
/// The display forms are kept on the record itself, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharacterKey {
    name: String,
    realm: String,
    region: Region,
}

impl CharacterKey {
    /// Builds a key, rejecting empty names or realms.
    ///
    /// ```
    /// use innkeeper_domain::{CharacterKey, Region};
    ///
    /// let a = CharacterKey::new("Thrall", "Argent Dawn", Region::Eu).expect("valid");
    /// let b = CharacterKey::new("THRALL", "argent dawn", Region::Eu).expect("valid");
    /// assert_eq!(a, b);
    /// ```
    pub fn new(name: &str, realm: &str, region: Region) -> Result<Self, DomainError> {
        let name = fold_identity(name);
        let realm = fold_identity(realm);
        if name.is_empty() {
            return Err(DomainError::validation("Character name cannot be empty"));
        }
        if realm.is_empty() {
            return Err(DomainError::validation("Realm cannot be empty"));
        }
        Ok(Self {
            name,
            realm,
            region,
        })
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

    /// True when this key refers to `name` on `realm`, in any region.
    pub fn matches_name_realm(&self, name: &str, realm: &str) -> bool {
        self.name == fold_identity(name) && self.realm == fold_identity(realm)
    }
}

impl fmt::Display for CharacterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}/{}", self.region, self.realm, self.name)
    }
}
