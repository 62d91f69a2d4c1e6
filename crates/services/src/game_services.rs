use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::GameServicesError;
use crate::leaderboard::LeaderboardService;
use crate::session_store::SessionStore;

/// Assembles the game-facing services over one shared storage backend.
#[derive(Clone)]
pub struct GameServices {
    leaderboard: Arc<LeaderboardService>,
    sessions: Arc<SessionStore>,
}

impl GameServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `GameServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, GameServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock))
    }

    /// Build services over an in-memory backend (tests and previews).
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), clock)
    }

    /// Build services over an already-initialized storage backend.
    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        Self {
            leaderboard: Arc::new(LeaderboardService::new(clock, Arc::clone(&storage.kv))),
            sessions: Arc::new(SessionStore::new(Arc::clone(&storage.kv))),
        }
    }

    #[must_use]
    pub fn leaderboard(&self) -> Arc<LeaderboardService> {
        Arc::clone(&self.leaderboard)
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<SessionStore> {
        Arc::clone(&self.sessions)
    }
}
