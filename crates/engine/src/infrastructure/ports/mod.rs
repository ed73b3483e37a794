//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Character data (could swap the proxy server for direct provider calls)
//! - Roster storage (could swap the JSON file for SQLite)
//! - Talent tree cache
//! - Clock (for testing)

mod error;
mod external;
mod repos;
mod testing;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{RosterRepo, TalentTreeCache};

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{CharacterDataPort, CharacterLocator, RealmInfo, RemoteProfile};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use external::MockCharacterDataPort;
#[cfg(test)]
pub use repos::{MockRosterRepo, MockTalentTreeCache};

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::ClockPort;

// =============================================================================
// Error Types
// =============================================================================
pub use error::{FetchError, RepoError};
