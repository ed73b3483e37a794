//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod clock;
pub mod config;
pub mod json_roster;
pub mod ports;
pub mod proxy_client;
pub mod talent_cache;
