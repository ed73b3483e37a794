//! Record mutation outcomes
//!
//! Aggregate mutations return these enums and structs so callers can tell
//! what actually changed (and whether the record needs saving) without
//! diffing state themselves.

pub mod record_events;

pub use record_events::*;
