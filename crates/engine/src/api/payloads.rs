//! JSON payloads written to stdout, one object per line.
//!
//! Every object carries a `status` tag the front end switches on. Payloads
//! echo the name and realm as the command spelled them.

use chrono::{DateTime, Utc};
use innkeeper_domain::value_objects::Profession;
use innkeeper_domain::{reward_tables, ActivityToggled, CacheField, CharacterRecord};
use serde_json::{json, Map, Value};

use crate::infrastructure::ports::RealmInfo;
use crate::use_cases::{ProfileRefresh, RosterRefresh, SyncError, Synced, TalentTree};

// =============================================================================
// Generic
// =============================================================================

pub fn ready() -> Value {
    json!({ "status": "ready" })
}

pub fn status(status: &str) -> Value {
    json!({ "status": status })
}

pub fn error(error: &dyn std::fmt::Display) -> Value {
    json!({ "status": "error", "message": error.to_string() })
}

pub fn characters(records: &[CharacterRecord]) -> Value {
    json!(records)
}

pub fn success(message: &str) -> Value {
    json!({ "status": "success", "message": message })
}

// =============================================================================
// Roster
// =============================================================================

pub fn realms(region: &str, realms: &[RealmInfo]) -> Value {
    let names: Vec<&str> = realms.iter().map(|r| r.name.as_str()).collect();
    json!({ "status": "realms", "region": region, "realms": names })
}

pub fn realms_error(region: &str, error: &SyncError) -> Value {
    json!({ "status": "realms_error", "region": region, "message": error.to_string() })
}

pub fn added(record: &CharacterRecord) -> Value {
    json!({ "status": "added", "character": record })
}

pub fn not_found(name: &str, realm: &str) -> Value {
    json!({ "status": "not_found", "name": name, "realm": realm })
}

/// Auto-add found no realm with the character.
pub fn not_found_in_region(name: &str, region: &str) -> Value {
    json!({ "status": "not_found", "name": name, "region": region })
}

pub fn deleted(name: &str, realm: &str) -> Value {
    json!({ "status": "deleted", "name": name, "realm": realm })
}

pub fn toggled(name: &str, toggled: &ActivityToggled) -> Value {
    json!({
        "status": "toggled",
        "name": name,
        "activity": toggled.activity,
        "new_status": toggled.status.as_str(),
    })
}

pub fn spec_refreshed(name: &str, realm: &str, refresh: &ProfileRefresh) -> Value {
    json!({
        "status": "spec_refreshed",
        "name": name,
        "realm": realm,
        "character": refresh.record,
        "spec_changed": refresh.change.spec_changed(),
    })
}

pub fn spec_refresh_error(name: &str, realm: &str, error: &SyncError) -> Value {
    json!({
        "status": "spec_refresh_error",
        "name": name,
        "realm": realm,
        "message": error.to_string(),
    })
}

pub fn roster_refreshed(outcome: &RosterRefresh) -> Value {
    let characters: Vec<&CharacterRecord> = outcome.refreshed.iter().map(|r| &r.record).collect();
    let spec_changes: Vec<Value> = outcome
        .refreshed
        .iter()
        .filter(|r| r.change.spec_changed())
        .map(|r| json!({ "name": r.record.name(), "realm": r.record.realm() }))
        .collect();
    let failed: Vec<Value> = outcome
        .failed
        .iter()
        .map(|(key, e)| {
            json!({ "name": key.name(), "realm": key.realm(), "message": e.to_string() })
        })
        .collect();
    json!({
        "status": "roster_refreshed",
        "characters": characters,
        "spec_changed": spec_changes,
        "failed": failed,
    })
}

// =============================================================================
// Cached Fields
// =============================================================================

pub fn refreshing(field: CacheField, name: &str, realm: &str) -> Value {
    json!({
        "status": format!("{}_refreshing", field.as_str()),
        "name": name,
        "realm": realm,
    })
}

pub fn field_error(field: CacheField, name: &str, realm: &str, error: &SyncError) -> Value {
    json!({
        "status": format!("{}_error", field.as_str()),
        "name": name,
        "realm": realm,
        "message": error.to_string(),
    })
}

pub fn equipment(name: &str, realm: &str, synced: &Synced) -> Value {
    json!({
        "status": "equipment",
        "name": name,
        "realm": realm,
        "items": synced.record.equipment(),
        "cached": synced.cached,
    })
}

fn world(record: &CharacterRecord) -> Value {
    json!(record.vault().world)
}

pub fn vault(name: &str, realm: &str, synced: &Synced) -> Value {
    let vault = synced.record.vault();
    let world_rewards: Vec<Option<u32>> = vault
        .world
        .as_slice()
        .iter()
        .map(|slot| slot.as_ref().map(|activity| activity.reward()))
        .collect();
    let mut mythic_plus = json!(vault.mythic_plus.clone().unwrap_or_default());
    if let Some(fields) = mythic_plus.as_object_mut() {
        fields.insert("keystone_ilvl_map".to_string(), keystone_ilvl_map());
    }
    json!({
        "status": "vault_data",
        "name": name,
        "realm": realm,
        "mythic_plus": mythic_plus,
        "raids": vault.raids.as_ref().map(|raids| json!({
            "kills_this_week": raids.kills_this_week,
            "total_kills": raids.total_kills(),
            "difficulty_breakdown": raids.difficulty_breakdown,
            "vault_rewards": raids.vault_rewards,
        })).unwrap_or_else(|| json!({
            "kills_this_week": [],
            "total_kills": 0,
            "difficulty_breakdown": {},
        })),
        "world": world(&synced.record),
        "world_rewards": world_rewards,
        "cached": synced.cached,
    })
}

/// Reward item level per keystone depth, keyed by depth.
fn keystone_ilvl_map() -> Value {
    let map: Map<String, Value> = reward_tables::keystone_table()
        .into_iter()
        .map(|(depth, item_level)| (depth.to_string(), json!(item_level)))
        .collect();
    Value::Object(map)
}

pub fn world_toggled(name: &str, realm: &str, record: &CharacterRecord) -> Value {
    json!({
        "status": "vault_world_toggled",
        "name": name,
        "realm": realm,
        "world": world(record),
    })
}

/// User-tracked crafting state shared by profession payloads.
fn profession_tracking(record: &CharacterRecord, payload: &mut Map<String, Value>) {
    let professions = record.professions();
    payload.insert("moxie".into(), json!(professions.moxie));
    payload.insert("concentration".into(), json!(professions.concentration));
    payload.insert("spark".into(), json!(professions.spark));
    payload.insert(
        "spark_collected_at".into(),
        json!(professions.spark_collected_at),
    );
    payload.insert("kp".into(), json!(professions.knowledge));
}

fn tagged(status: &str, name: &str, realm: &str) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("status".into(), json!(status));
    payload.insert("name".into(), json!(name));
    payload.insert("realm".into(), json!(realm));
    payload
}

pub fn professions(name: &str, realm: &str, synced: &Synced, now: DateTime<Utc>) -> Value {
    let record = &synced.record;
    let full_in: Map<String, Value> = record
        .professions()
        .concentration
        .keys()
        .map(|profession: &Profession| {
            let secs = record.concentration_time_to_full(*profession, now).as_secs();
            (profession.name().to_string(), json!(secs))
        })
        .collect();

    let mut payload = tagged("professions_data", name, realm);
    payload.insert(
        "professions".into(),
        json!({ "primaries": record.professions().primaries }),
    );
    profession_tracking(record, &mut payload);
    payload.insert("concentration_full_in".into(), Value::Object(full_in));
    payload.insert("cached".into(), json!(synced.cached));
    Value::Object(payload)
}

pub fn prof_updated(name: &str, realm: &str, record: &CharacterRecord) -> Value {
    let mut payload = tagged("prof_updated", name, realm);
    profession_tracking(record, &mut payload);
    Value::Object(payload)
}

pub fn housing_updated(name: &str, realm: &str, record: &CharacterRecord) -> Value {
    let mut payload = tagged("housing_updated", name, realm);
    payload.insert("housing_tracked".into(), json!(record.decor()));
    Value::Object(payload)
}

// =============================================================================
// Talents
// =============================================================================

pub fn talent_tree(class_slug: &str, spec_slug: &str, found: &TalentTree) -> Value {
    json!({
        "status": "talent_tree",
        "class_slug": class_slug,
        "spec_slug": spec_slug,
        "tree": found.tree,
        "cached": found.cached,
    })
}

pub fn talent_tree_error(class_slug: &str, spec_slug: &str, error: &SyncError) -> Value {
    json!({
        "status": "talent_tree_error",
        "class_slug": class_slug,
        "spec_slug": spec_slug,
        "message": error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use innkeeper_domain::value_objects::{ProfileSnapshot, WorldActivity};
    use innkeeper_domain::Region;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 11, 12, 0, 0)
            .single()
            .expect("valid date")
    }

    fn record() -> CharacterRecord {
        CharacterRecord::new(
            "Jaina",
            "Kazzak",
            Region::Eu,
            ProfileSnapshot::default(),
            now(),
        )
        .expect("valid record")
    }

    #[test]
    fn empty_vault_has_placeholder_sections() {
        let mut record = record();
        record
            .set_world_slot(1, WorldActivity::new("Delve", 8).expect("activity"))
            .expect("slot");
        let synced = Synced {
            record,
            cached: true,
            mutated: false,
        };

        let payload = vault("Jaina", "Kazzak", &synced);

        assert_eq!(payload["status"], "vault_data");
        assert_eq!(payload["raids"]["total_kills"], 0);
        assert_eq!(payload["world"].as_array().map(Vec::len), Some(8));
        assert_eq!(payload["world"][1]["type"], "Delve");
        assert_eq!(payload["world_rewards"][1], 259);
        assert!(payload["world_rewards"][0].is_null());
    }

    #[test]
    fn vault_carries_the_keystone_reward_map() {
        let synced = Synced {
            record: record(),
            cached: false,
            mutated: false,
        };

        let payload = vault("Jaina", "Kazzak", &synced);
        let map = &payload["mythic_plus"]["keystone_ilvl_map"];

        assert_eq!(map["2"], 259);
        assert_eq!(map["10"], 272);
        assert_eq!(
            map.as_object().map(|m| m.len()),
            Some(reward_tables::keystone_table().len())
        );
        assert!(payload["mythic_plus"]["best_runs"].is_array());
    }

    #[test]
    fn professions_report_time_to_full() {
        let mut record = record();
        record
            .set_concentration(Profession::Tailoring, 750, now())
            .expect("concentration");
        let synced = Synced {
            record,
            cached: false,
            mutated: true,
        };

        let payload = professions("Jaina", "Kazzak", &synced, now());

        assert_eq!(payload["concentration"]["Tailoring"]["current"], 750);
        assert_eq!(payload["concentration_full_in"]["Tailoring"], 86400);
        assert_eq!(payload["spark"], false);
        assert_eq!(payload["professions"]["primaries"], json!([]));
    }

    #[test]
    fn refreshing_status_names_the_field() {
        let payload = refreshing(CacheField::Vault, "Jaina", "Kazzak");
        assert_eq!(payload["status"], "vault_refreshing");
    }
}
