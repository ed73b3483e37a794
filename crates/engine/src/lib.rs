//! Innkeeper Engine library.
//!
//! Keeps a roster of game characters in sync with a remote data provider,
//! honoring daily and weekly reset boundaries.
//!
//! ## Structure
//!
//! - `stores/` - The in-memory roster with per-record locking
//! - `use_cases/` - Sync and roster operations
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - The stdin/stdout line protocol
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;

pub use app::App;
