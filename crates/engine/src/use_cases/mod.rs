//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific area of the roster.
//! Use cases orchestrate the store, the provider port and the clock.

mod error;
pub mod roster;
pub mod sync;
pub mod talents;

// Re-export main types
pub use error::SyncError;
pub use roster::{AddedCharacter, ProfileRefresh, RosterRefresh, RosterUseCases};
pub use sync::{SyncEngine, SyncMode, SyncObserver, SyncSettings, SyncSignal, Synced};
pub use talents::{TalentTree, TalentTrees};
