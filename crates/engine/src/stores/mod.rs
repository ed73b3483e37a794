//! In-memory state storage modules.
//!
//! Stores manage runtime state shared across use cases:
//! - `RosterStore` - the live character roster, write-through to its repo

pub mod roster;

// Re-export store types
pub use roster::{RecordSlot, RosterStore};
