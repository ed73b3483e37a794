//! Lenient readers for persisted record fields.
//!
//! Roster files written by earlier engine versions use looser shapes than
//! the ones written today: `{}` for a cache that was never fetched, a wrapped
//! `{"primaries": [...]}` profession list, expansion-qualified profession
//! labels, `"?"` for an unknown level and naive ISO timestamps. Each reader
//! accepts both the old and the current shape.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

use crate::value_objects::{
    KeystoneRun, KeystoneSummary, KnowledgeSource, Profession, ProfessionSkill, RaidKill,
    RaidSummary,
};

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// RFC 3339 or naive ISO 8601 (read as UTC); anything unparseable is absent.
pub(crate) fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLevel {
    Number(u32),
    Text(String),
    Other(IgnoredAny),
}

/// Character level; placeholders such as `"?"` read as 0.
pub(crate) fn level<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawLevel::deserialize(deserializer)? {
        RawLevel::Number(level) => level,
        RawLevel::Text(text) => text.trim().parse().unwrap_or(0),
        RawLevel::Other(_) => 0,
    })
}

#[derive(Deserialize)]
struct PersistedKeystones {
    best_runs: Option<Vec<KeystoneRun>>,
}

/// Keystone cache; an object without `best_runs` was never fetched.
///
/// Reward slots are rederived from the runs, so dict-form slots written by
/// earlier versions are ignored.
pub(crate) fn keystones<'de, D>(deserializer: D) -> Result<Option<KeystoneSummary>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<PersistedKeystones> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|k| k.best_runs).map(KeystoneSummary::from_runs))
}

#[derive(Deserialize)]
struct PersistedRaids {
    kills_this_week: Option<Vec<RaidKill>>,
}

/// Raid cache; an object without `kills_this_week` was never fetched.
pub(crate) fn raids<'de, D>(deserializer: D) -> Result<Option<RaidSummary>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<PersistedRaids> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|r| r.kills_this_week).map(RaidSummary::from_kills))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PersistedProfessions {
    List(Vec<ProfessionSkill>),
    Wrapped {
        #[serde(default)]
        primaries: Vec<ProfessionSkill>,
    },
}

/// Profession skills, either as a list or wrapped in `{"primaries": [...]}`.
pub(crate) fn profession_skills<'de, D>(deserializer: D) -> Result<Vec<ProfessionSkill>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<PersistedProfessions> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(PersistedProfessions::List(primaries))
        | Some(PersistedProfessions::Wrapped { primaries }) => primaries,
        None => Vec::new(),
    })
}

/// Map keyed by profession label; labels naming no known profession are dropped.
pub(crate) fn profession_map<'de, D, V>(
    deserializer: D,
) -> Result<BTreeMap<Profession, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    let raw: Option<BTreeMap<String, V>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(label, value)| Profession::from_label(&label).map(|p| (p, value)))
        .collect())
}

/// Weekly knowledge flags; unknown professions and sources are dropped.
pub(crate) fn knowledge<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<Profession, BTreeMap<KnowledgeSource, bool>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<Profession, BTreeMap<String, bool>> = profession_map(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(profession, sources)| {
            let sources: BTreeMap<KnowledgeSource, bool> = sources
                .into_iter()
                .filter_map(|(label, flag)| label.parse().ok().map(|s| (s, flag)))
                .collect();
            (profession, sources)
        })
        .collect())
}
