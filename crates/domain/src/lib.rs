//! Innkeeper domain: character records, reset rules and vault rewards.
//!
//! Pure logic only. Nothing in this crate does I/O or reads the system
//! clock; the engine passes `now` in.

pub mod aggregates;
pub mod error;
pub mod events;
pub mod identity;
mod persisted;
pub mod reset_clock;
pub mod reward_tables;
pub mod value_objects;

pub use aggregates::{CacheField, CharacterRecord};
pub use error::{DomainError, DomainResult};
pub use events::{ActivityToggled, ProfileChange, ResetOutcome};
pub use identity::{fold_identity, CharacterKey, Region};
pub use reset_clock::ResetCadence;
