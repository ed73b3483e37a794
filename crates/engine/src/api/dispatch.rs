//! Routes parsed commands to use cases and emits their payloads.

use std::sync::Arc;

use innkeeper_domain::{CacheField, CharacterKey, CharacterRecord};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use crate::app::App;
use crate::use_cases::{SyncError, SyncMode, SyncSignal};

use super::commands::{Command, NameRealm, Target};
use super::payloads;

/// Whether the command loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Sends one payload to the output writer.
pub fn emit(out: &UnboundedSender<Value>, payload: Value) {
    if out.send(payload).is_err() {
        tracing::warn!("Output closed, dropping payload");
    }
}

pub struct CommandDispatcher {
    app: Arc<App>,
    out: UnboundedSender<Value>,
}

impl CommandDispatcher {
    pub fn new(app: Arc<App>, out: UnboundedSender<Value>) -> Self {
        Self { app, out }
    }

    fn emit(&self, payload: Value) {
        emit(&self.out, payload);
    }

    /// Parses and runs one input line. Malformed lines produce an error payload.
    pub async fn handle_line(&self, line: &str) -> Flow {
        let line = line.trim();
        if line.is_empty() {
            return Flow::Continue;
        }
        match line.parse::<Command>() {
            Ok(command) => self.dispatch(command).await,
            Err(e) => {
                tracing::warn!(line = %line, error = %e, "Rejected command");
                self.emit(payloads::error(&e));
                Flow::Continue
            }
        }
    }

    pub async fn dispatch(&self, command: Command) -> Flow {
        tracing::debug!(command = ?command, "Dispatching command");
        let roster = &self.app.use_cases.roster;

        match command {
            Command::Exit => return Flow::Exit,

            Command::GetCharacters => match roster.list().await {
                Ok(records) => self.emit(payloads::characters(&records)),
                Err(e) => self.emit(payloads::error(&e)),
            },

            Command::GetRealms { region } => match roster.realms(region).await {
                Ok(realms) => self.emit(payloads::realms(region.as_str(), &realms)),
                Err(e) => self.emit(payloads::realms_error(region.as_str(), &e)),
            },

            Command::AddCharacter(target) => {
                match roster
                    .add_character(target.region, &target.realm, &target.name)
                    .await
                {
                    Ok(added) => self.emit(payloads::added(&added.record)),
                    Err(e) if e.is_remote_not_found() => {
                        self.emit(payloads::not_found(&target.name, &target.realm))
                    }
                    Err(e) => self.emit(payloads::error(&e)),
                }
            }

            Command::AutoAdd { region, name } => match roster.auto_add(region, &name).await {
                Ok(added) => self.emit(payloads::added(&added.record)),
                Err(e) if e.is_remote_not_found() => {
                    self.emit(payloads::not_found_in_region(&name, region.as_str()))
                }
                Err(e) => self.emit(payloads::error(&e)),
            },

            Command::DeleteCharacter(who) => match roster.delete(&who.name, &who.realm).await {
                Ok(_) => self.emit(payloads::deleted(&who.name, &who.realm)),
                Err(e) => self.emit(payloads::error(&e)),
            },

            Command::ToggleActivity { who, activity } => {
                match roster.toggle_activity(&who.name, &who.realm, &activity).await {
                    Ok(toggled) => self.emit(payloads::toggled(&who.name, &toggled)),
                    Err(e) => self.emit(payloads::error(&e)),
                }
            }

            Command::GetEquipment(target) => {
                self.sync_field(target, CacheField::Equipment, SyncMode::Cached)
                    .await
            }
            Command::RefreshEquipment(target) => {
                self.sync_field(target, CacheField::Equipment, SyncMode::Force)
                    .await
            }
            Command::GetVault(target) => {
                self.sync_field(target, CacheField::Vault, SyncMode::Cached)
                    .await
            }
            Command::RefreshVault(target) => {
                self.sync_field(target, CacheField::Vault, SyncMode::Force)
                    .await
            }
            Command::GetProfessions(target) => {
                self.sync_field(target, CacheField::Professions, SyncMode::Cached)
                    .await
            }

            Command::RefreshSpec(target) => {
                let result = match self.resolve(&target) {
                    Ok(key) => roster.refresh_profile(&key).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(refresh) => self.emit(payloads::spec_refreshed(
                        &target.name,
                        &target.realm,
                        &refresh,
                    )),
                    Err(e) => self.emit(payloads::spec_refresh_error(
                        &target.name,
                        &target.realm,
                        &e,
                    )),
                }
            }

            Command::SetVaultWorld {
                who,
                slot,
                activity_type,
                tier,
            } => {
                let result = roster
                    .set_world_slot(&who.name, &who.realm, slot, &activity_type, tier)
                    .await;
                self.emit_record(&who, result, payloads::world_toggled);
            }
            Command::ClearVaultWorld { who, slot } => {
                let result = roster.clear_world_slot(&who.name, &who.realm, slot).await;
                self.emit_record(&who, result, payloads::world_toggled);
            }

            Command::SetProfMoxie {
                who,
                profession,
                amount,
            } => {
                let result = roster
                    .set_moxie(&who.name, &who.realm, profession, amount)
                    .await;
                self.emit_record(&who, result, payloads::prof_updated);
            }
            Command::SetProfConcentration {
                who,
                profession,
                current,
            } => {
                let result = roster
                    .set_concentration(&who.name, &who.realm, profession, current)
                    .await;
                self.emit_record(&who, result, payloads::prof_updated);
            }
            Command::ToggleProfSpark(who) => {
                let result = roster.toggle_spark(&who.name, &who.realm).await;
                self.emit_record(&who, result, payloads::prof_updated);
            }
            Command::ToggleProfKnowledge {
                who,
                profession,
                source,
            } => {
                let result = roster
                    .toggle_knowledge(&who.name, &who.realm, profession, source)
                    .await;
                self.emit_record(&who, result, payloads::prof_updated);
            }

            Command::TrackHousingItem {
                who,
                item,
                materials,
            } => {
                let result = roster
                    .track_decor(&who.name, &who.realm, &item, &materials)
                    .await;
                self.emit_record(&who, result, payloads::housing_updated);
            }
            Command::SetHousingMaterial {
                who,
                item,
                material,
                amount,
            } => {
                let result = roster
                    .set_decor_material(&who.name, &who.realm, &item, &material, amount)
                    .await;
                self.emit_record(&who, result, payloads::housing_updated);
            }

            Command::FetchTalentTree {
                region,
                class_slug,
                spec_slug,
            } => {
                let talents = &self.app.use_cases.talents;
                let payload = match talents.fetch(region, &class_slug, &spec_slug).await {
                    Ok(found) => payloads::talent_tree(&class_slug, &spec_slug, &found),
                    Err(e) => payloads::talent_tree_error(&class_slug, &spec_slug, &e),
                };
                self.emit(payload);
            }
            Command::ClearTalentCache => match self.app.use_cases.talents.clear_cache().await {
                Ok(()) => self.emit(payloads::success("Talent tree cache cleared")),
                Err(e) => self.emit(payloads::error(&e)),
            },

            Command::RefreshAll => self.refresh_all(),
        }
        Flow::Continue
    }

    fn resolve(&self, target: &Target) -> Result<CharacterKey, SyncError> {
        self.app
            .store
            .resolve(&target.name, &target.realm, Some(target.region))
            .ok_or_else(|| SyncError::record_not_found(&target.name, &target.realm))
    }

    fn emit_record<F>(
        &self,
        who: &NameRealm,
        result: Result<CharacterRecord, SyncError>,
        payload: F,
    ) where
        F: FnOnce(&str, &str, &CharacterRecord) -> Value,
    {
        match result {
            Ok(record) => self.emit(payload(&who.name, &who.realm, &record)),
            Err(e) => self.emit(payloads::error(&e)),
        }
    }

    async fn sync_field(&self, target: Target, field: CacheField, mode: SyncMode) {
        let out = self.out.clone();
        let (name, realm) = (target.name.clone(), target.realm.clone());
        let observer = move |signal: SyncSignal| {
            let SyncSignal::Refreshing { field, .. } = signal;
            emit(&out, payloads::refreshing(field, &name, &realm));
        };

        let result = match self.resolve(&target) {
            Ok(key) => {
                self.app
                    .use_cases
                    .sync
                    .sync(&key, field, mode, &observer)
                    .await
            }
            Err(e) => Err(e),
        };

        let payload = match result {
            Ok(synced) => match field {
                CacheField::Equipment => payloads::equipment(&target.name, &target.realm, &synced),
                CacheField::Vault => payloads::vault(&target.name, &target.realm, &synced),
                CacheField::Professions => {
                    let now = self.app.clock.now();
                    payloads::professions(&target.name, &target.realm, &synced, now)
                }
            },
            Err(e) => payloads::field_error(field, &target.name, &target.realm, &e),
        };
        self.emit(payload);
    }

    /// Runs the bulk refresh in the background so the command loop keeps serving.
    fn refresh_all(&self) {
        let roster = Arc::clone(&self.app.use_cases.roster);
        let out = self.out.clone();
        self.emit(payloads::status("roster_refreshing"));
        tokio::spawn(async move {
            let payload = match roster.refresh_roster().await {
                Ok(outcome) => payloads::roster_refreshed(&outcome),
                Err(e) => payloads::error(&e),
            };
            emit(&out, payload);
        });
    }
}
