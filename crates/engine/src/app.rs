//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::ports::{CharacterDataPort, ClockPort, RosterRepo, TalentTreeCache};
use crate::stores::RosterStore;
use crate::use_cases::{RosterUseCases, SyncEngine, SyncError, SyncSettings, TalentTrees};

/// Main application state.
///
/// Holds the roster store and the use cases that operate on it.
/// Shared with the command dispatcher by `Arc`.
pub struct App {
    pub store: Arc<RosterStore>,
    pub clock: Arc<dyn ClockPort>,
    pub use_cases: UseCases,
}

/// Container for all use cases.
pub struct UseCases {
    pub sync: Arc<SyncEngine>,
    pub roster: Arc<RosterUseCases>,
    pub talents: Arc<TalentTrees>,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(
        port: Arc<dyn CharacterDataPort>,
        repo: Arc<dyn RosterRepo>,
        talent_cache: Arc<dyn TalentTreeCache>,
        clock: Arc<dyn ClockPort>,
        settings: SyncSettings,
    ) -> Self {
        let store = Arc::new(RosterStore::new(repo));

        let sync = Arc::new(SyncEngine::new(
            store.clone(),
            port.clone(),
            clock.clone(),
            settings,
        ));
        let roster = Arc::new(RosterUseCases::new(
            store.clone(),
            port.clone(),
            clock.clone(),
            settings,
        ));
        let talents = Arc::new(TalentTrees::new(port, talent_cache, settings));

        Self {
            store,
            clock,
            use_cases: UseCases {
                sync,
                roster,
                talents,
            },
        }
    }

    /// Loads the persisted roster and runs the startup reset sweep.
    ///
    /// When the roster cannot be loaded nothing is swept and the store
    /// refuses to save, so the file on disk stays as it was.
    pub async fn start(&self) -> Result<usize, SyncError> {
        self.store.load().await?;
        self.use_cases.roster.startup_sweep().await
    }
}
