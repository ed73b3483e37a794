//! Line protocol commands.
//!
//! Each stdin line is `VERB` or `VERB:arg:arg...`. Arguments are split on
//! `:` at most as many times as the verb takes arguments, so the last
//! argument may itself contain colons. Every argument is trimmed.

use std::str::FromStr;

use innkeeper_domain::value_objects::{KnowledgeSource, Profession};
use innkeeper_domain::Region;

/// Failure to turn a line into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownVerb(String),

    #[error("{verb} expects {expected} arguments, got {got}")]
    Arity {
        verb: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{verb}: {message}")]
    InvalidArgument { verb: &'static str, message: String },
}

/// A character addressed with its region, as lookup commands do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub region: Region,
    pub realm: String,
    pub name: String,
}

/// A character addressed by name and realm only, as tracking commands do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRealm {
    pub name: String,
    pub realm: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GetCharacters,
    GetRealms {
        region: Region,
    },
    AddCharacter(Target),
    /// Finds the character on any realm of the region.
    AutoAdd {
        region: Region,
        name: String,
    },
    DeleteCharacter(NameRealm),
    ToggleActivity {
        who: NameRealm,
        activity: String,
    },
    GetEquipment(Target),
    RefreshEquipment(Target),
    RefreshSpec(Target),
    GetVault(Target),
    RefreshVault(Target),
    SetVaultWorld {
        who: NameRealm,
        slot: usize,
        activity_type: String,
        tier: u8,
    },
    ClearVaultWorld {
        who: NameRealm,
        slot: usize,
    },
    GetProfessions(Target),
    SetProfMoxie {
        who: NameRealm,
        profession: Profession,
        amount: u32,
    },
    SetProfConcentration {
        who: NameRealm,
        profession: Profession,
        current: u32,
    },
    ToggleProfSpark(NameRealm),
    ToggleProfKnowledge {
        who: NameRealm,
        profession: Profession,
        source: KnowledgeSource,
    },
    TrackHousingItem {
        who: NameRealm,
        item: String,
        materials: Vec<String>,
    },
    SetHousingMaterial {
        who: NameRealm,
        item: String,
        material: String,
        amount: u32,
    },
    FetchTalentTree {
        region: Region,
        class_slug: String,
        spec_slug: String,
    },
    ClearTalentCache,
    RefreshAll,
    Exit,
}

// =============================================================================
// Parsing
// =============================================================================

/// Splits `rest` into exactly `expected` trimmed arguments.
fn split_args<'a>(
    verb: &'static str,
    rest: Option<&'a str>,
    expected: usize,
) -> Result<Vec<&'a str>, CommandError> {
    let args: Vec<&str> = match rest {
        Some(rest) => rest.splitn(expected, ':').map(str::trim).collect(),
        None => Vec::new(),
    };
    if args.len() != expected {
        return Err(CommandError::Arity {
            verb,
            expected,
            got: args.len(),
        });
    }
    if let Some(position) = args.iter().position(|arg| arg.is_empty()) {
        return Err(CommandError::InvalidArgument {
            verb,
            message: format!("argument {} is empty", position + 1),
        });
    }
    Ok(args)
}

fn parse_arg<T>(verb: &'static str, what: &str, raw: &str) -> Result<T, CommandError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| CommandError::InvalidArgument {
        verb,
        message: format!("invalid {} '{}': {}", what, raw, e),
    })
}

fn target(verb: &'static str, rest: Option<&str>) -> Result<Target, CommandError> {
    let args = split_args(verb, rest, 3)?;
    Ok(Target {
        region: parse_arg(verb, "region", args[0])?,
        realm: args[1].to_string(),
        name: args[2].to_string(),
    })
}

fn name_realm(name: &str, realm: &str) -> NameRealm {
    NameRealm {
        name: name.to_string(),
        realm: realm.to_string(),
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(':') {
            Some((verb, rest)) => (verb.trim(), Some(rest)),
            None => (line, None),
        };

        let command = match verb {
            "GET_CHARACTERS" => Command::GetCharacters,
            "REFRESH_ALL" => Command::RefreshAll,
            "CLEAR_TALENT_CACHE" => Command::ClearTalentCache,
            "EXIT" => Command::Exit,
            "GET_REALMS" => {
                let args = split_args("GET_REALMS", rest, 1)?;
                Command::GetRealms {
                    region: parse_arg("GET_REALMS", "region", args[0])?,
                }
            }
            "ADD_CHARACTER" => Command::AddCharacter(target("ADD_CHARACTER", rest)?),
            "AUTO_ADD" => {
                let args = split_args("AUTO_ADD", rest, 2)?;
                Command::AutoAdd {
                    region: parse_arg("AUTO_ADD", "region", args[0])?,
                    name: args[1].to_string(),
                }
            }
            "DELETE_CHARACTER" => {
                let args = split_args("DELETE_CHARACTER", rest, 2)?;
                Command::DeleteCharacter(name_realm(args[0], args[1]))
            }
            "TOGGLE_ACTIVITY" => {
                let args = split_args("TOGGLE_ACTIVITY", rest, 3)?;
                Command::ToggleActivity {
                    who: name_realm(args[0], args[1]),
                    activity: args[2].to_string(),
                }
            }
            "GET_EQUIPMENT" => Command::GetEquipment(target("GET_EQUIPMENT", rest)?),
            "REFRESH_EQUIPMENT" => Command::RefreshEquipment(target("REFRESH_EQUIPMENT", rest)?),
            "REFRESH_SPEC" => Command::RefreshSpec(target("REFRESH_SPEC", rest)?),
            "GET_VAULT" => Command::GetVault(target("GET_VAULT", rest)?),
            "REFRESH_VAULT" => Command::RefreshVault(target("REFRESH_VAULT", rest)?),
            "SET_VAULT_WORLD" => {
                let verb = "SET_VAULT_WORLD";
                let args = split_args(verb, rest, 5)?;
                Command::SetVaultWorld {
                    who: name_realm(args[0], args[1]),
                    slot: parse_arg(verb, "slot", args[2])?,
                    activity_type: args[3].to_string(),
                    tier: parse_arg(verb, "tier", args[4])?,
                }
            }
            "CLEAR_VAULT_WORLD" => {
                let verb = "CLEAR_VAULT_WORLD";
                let args = split_args(verb, rest, 3)?;
                Command::ClearVaultWorld {
                    who: name_realm(args[0], args[1]),
                    slot: parse_arg(verb, "slot", args[2])?,
                }
            }
            "GET_PROFESSIONS" => Command::GetProfessions(target("GET_PROFESSIONS", rest)?),
            "SET_PROF_MOXIE" => {
                let verb = "SET_PROF_MOXIE";
                let args = split_args(verb, rest, 4)?;
                Command::SetProfMoxie {
                    who: name_realm(args[0], args[1]),
                    profession: parse_arg(verb, "profession", args[2])?,
                    amount: parse_arg(verb, "amount", args[3])?,
                }
            }
            "SET_PROF_CONCENTRATION" => {
                let verb = "SET_PROF_CONCENTRATION";
                let args = split_args(verb, rest, 4)?;
                Command::SetProfConcentration {
                    who: name_realm(args[0], args[1]),
                    profession: parse_arg(verb, "profession", args[2])?,
                    current: parse_arg(verb, "concentration", args[3])?,
                }
            }
            "TOGGLE_PROF_SPARK" => {
                let args = split_args("TOGGLE_PROF_SPARK", rest, 2)?;
                Command::ToggleProfSpark(name_realm(args[0], args[1]))
            }
            "TOGGLE_PROF_KP" => {
                let verb = "TOGGLE_PROF_KP";
                let args = split_args(verb, rest, 4)?;
                Command::ToggleProfKnowledge {
                    who: name_realm(args[0], args[1]),
                    profession: parse_arg(verb, "profession", args[2])?,
                    source: parse_arg(verb, "knowledge source", args[3])?,
                }
            }
            "TRACK_HOUSING_ITEM" => {
                let args = split_args("TRACK_HOUSING_ITEM", rest, 4)?;
                Command::TrackHousingItem {
                    who: name_realm(args[0], args[1]),
                    item: args[2].to_string(),
                    materials: args[3]
                        .split(',')
                        .map(str::trim)
                        .filter(|m| !m.is_empty())
                        .map(str::to_string)
                        .collect(),
                }
            }
            "SET_HOUSING_MATERIAL" => {
                let verb = "SET_HOUSING_MATERIAL";
                let args = split_args(verb, rest, 5)?;
                Command::SetHousingMaterial {
                    who: name_realm(args[0], args[1]),
                    item: args[2].to_string(),
                    material: args[3].to_string(),
                    amount: parse_arg(verb, "amount", args[4])?,
                }
            }
            "FETCH_TALENT_TREE" => {
                let verb = "FETCH_TALENT_TREE";
                let args = split_args(verb, rest, 3)?;
                Command::FetchTalentTree {
                    region: parse_arg(verb, "region", args[0])?,
                    class_slug: args[1].to_string(),
                    spec_slug: args[2].to_string(),
                }
            }
            other => return Err(CommandError::UnknownVerb(other.to_string())),
        };
        Ok(command)
    }
}
