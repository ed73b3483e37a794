//! Profile snapshot: the wholesale-overwritten part of a character.

use serde::{Deserialize, Serialize};

/// Profile fields fetched from the provider.
///
/// A refresh replaces the whole snapshot; fields are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSnapshot {
    #[serde(deserialize_with = "crate::persisted::level")]
    pub level: u32,
    pub class_id: Option<u32>,
    pub class_name: String,
    pub class_slug: String,
    pub spec_name: String,
    pub spec_slug: String,
    pub item_level: u32,
    pub portrait_url: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileSnapshot {
    /// Builds a snapshot, deriving the class and spec slugs.
    pub fn new(
        level: u32,
        class_id: Option<u32>,
        class_name: impl Into<String>,
        spec_name: impl Into<String>,
        item_level: u32,
    ) -> Self {
        let spec_name = spec_name.into();
        Self {
            level,
            class_id,
            class_name: class_name.into(),
            class_slug: class_slug(class_id).to_string(),
            spec_slug: spec_slug(&spec_name),
            spec_name,
            item_level,
            portrait_url: None,
            avatar_url: None,
        }
    }

    pub fn with_media(mut self, portrait_url: Option<String>, avatar_url: Option<String>) -> Self {
        self.portrait_url = portrait_url;
        self.avatar_url = avatar_url;
        self
    }
}

/// URL slug for a playable class id; unknown ids fall back to "warrior".
pub fn class_slug(class_id: Option<u32>) -> &'static str {
    match class_id {
        Some(2) => "paladin",
        Some(3) => "hunter",
        Some(4) => "rogue",
        Some(5) => "priest",
        Some(6) => "death-knight",
        Some(7) => "shaman",
        Some(8) => "mage",
        Some(9) => "warlock",
        Some(10) => "monk",
        Some(11) => "druid",
        Some(12) => "demon-hunter",
        Some(13) => "evoker",
        _ => "warrior",
    }
}

/// URL slug for a specialization name ("Beast Mastery" -> "beast-mastery").
pub fn spec_slug(spec_name: &str) -> String {
    spec_name.trim().to_lowercase().replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_derived_on_construction() {
        let profile = ProfileSnapshot::new(80, Some(3), "Hunter", "Beast Mastery", 250);
        assert_eq!(profile.class_slug, "hunter");
        assert_eq!(profile.spec_slug, "beast-mastery");
    }

    #[test]
    fn unknown_class_falls_back() {
        assert_eq!(class_slug(None), "warrior");
        assert_eq!(class_slug(Some(99)), "warrior");
        assert_eq!(class_slug(Some(12)), "demon-hunter");
    }
}
