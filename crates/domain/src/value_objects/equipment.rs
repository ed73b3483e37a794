//! Equipped item descriptors.

use serde::{Deserialize, Serialize};

/// One equipped item as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquippedItem {
    pub slot: String,
    pub name: String,
    #[serde(rename = "ilvl")]
    pub item_level: u32,
    #[serde(default)]
    pub quality: String,
    /// Resolved by the proxy; absent when the provider has no icon.
    #[serde(default)]
    pub icon_url: Option<String>,
}

impl EquippedItem {
    pub fn new(slot: impl Into<String>, name: impl Into<String>, item_level: u32) -> Self {
        Self {
            slot: slot.into(),
            name: name.into(),
            item_level,
            quality: "COMMON".to_string(),
            icon_url: None,
        }
    }
}
