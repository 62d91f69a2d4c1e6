use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use quiz_core::model::{GameSession, ScoringRules, SessionError, SessionStats};
use storage::repository::{InMemoryStore, KeyValueRepository};

use crate::error::SessionStoreError;

/// Storage key under which the in-progress session snapshot lives.
pub const SESSION_KEY: &str = "focus_game_current_session";

/// Persisted shape of an in-progress session.
///
/// Flat camelCase JSON like the leaderboard rows; `bestRT` is `0` before the
/// first answer. Scoring rules are not persisted; a resumed session plays
/// with the defaults.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionSnapshot {
    topic: String,
    mission: String,
    total_rounds: u32,
    completed_rounds: u32,
    score: u32,
    streak: u32,
    correct_answers: u32,
    total_answered: u32,
    #[serde(rename = "bestRT")]
    best_rt: u32,
    started_at: DateTime<Utc>,
}

impl SessionSnapshot {
    fn from_session(session: &GameSession) -> Self {
        let stats = session.stats();
        Self {
            topic: session.topic().to_owned(),
            mission: session.mission().to_owned(),
            total_rounds: session.total_rounds(),
            completed_rounds: session.completed_rounds(),
            score: stats.score(),
            streak: stats.streak(),
            correct_answers: stats.correct_answers(),
            total_answered: stats.total_answered(),
            best_rt: stats.best_reaction_time_ms().unwrap_or(0),
            started_at: session.started_at(),
        }
    }

    fn into_session(self) -> Result<GameSession, SessionError> {
        let best_rt = if self.best_rt == 0 {
            None
        } else {
            Some(self.best_rt)
        };
        let stats = SessionStats::from_persisted(
            self.score,
            self.streak,
            self.correct_answers,
            self.total_answered,
            best_rt,
        )?;

        GameSession::from_persisted(
            self.topic,
            self.mission,
            self.total_rounds,
            self.completed_rounds,
            stats,
            ScoringRules::default(),
            self.started_at,
        )
    }
}

/// Persists the session a player is in the middle of, so an interrupted run
/// can resume where it left off.
///
/// Mirrors the leaderboard's degradation story: failed writes land in an
/// in-process store and failed reads fall back to it, invisibly to callers;
/// only [`SessionStore::clear_session`] surfaces backend failures.
pub struct SessionStore {
    store: Arc<dyn KeyValueRepository>,
    fallback: InMemoryStore,
    write_lock: Mutex<()>,
}

impl SessionStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueRepository>) -> Self {
        Self {
            store,
            fallback: InMemoryStore::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Saves the current session snapshot, replacing any previous one.
    pub async fn save(&self, session: &GameSession) {
        let _guard = self.write_lock.lock().await;

        let snapshot = SessionSnapshot::from_session(session);
        match serde_json::to_string(&snapshot) {
            Ok(payload) => {
                if let Err(err) = self.store.set(SESSION_KEY, &payload).await {
                    warn!("session write failed, keeping snapshot in process memory: {err}");
                    if let Err(err) = self.fallback.set(SESSION_KEY, &payload).await {
                        warn!("fallback write failed, session snapshot dropped: {err}");
                    }
                } else {
                    debug!(
                        round = session.completed_rounds(),
                        "session snapshot persisted"
                    );
                }
            }
            Err(err) => warn!("failed to encode session snapshot, save dropped: {err}"),
        }
    }

    /// Restores the saved session, if one exists.
    ///
    /// Missing, undecodable, or invariant-violating snapshots yield `None`;
    /// the player simply starts fresh.
    pub async fn load(&self) -> Option<GameSession> {
        let payload = match self.store.get(SESSION_KEY).await {
            Ok(Some(payload)) => Some(payload),
            Ok(None) => self.fallback.get(SESSION_KEY).await.ok().flatten(),
            Err(err) => {
                warn!("session read failed, using fallback: {err}");
                self.fallback.get(SESSION_KEY).await.ok().flatten()
            }
        }?;

        let snapshot: SessionSnapshot = match serde_json::from_str(&payload) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("undecodable session snapshot, starting fresh: {err}");
                return None;
            }
        };

        match snapshot.into_session() {
            Ok(session) => Some(session),
            Err(err) => {
                warn!("persisted session violates invariants, starting fresh: {err}");
                None
            }
        }
    }

    /// Removes the saved snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError::Storage` if the backend delete fails. The
    /// fallback is cleared first regardless.
    pub async fn clear_session(&self) -> Result<(), SessionStoreError> {
        let _guard = self.write_lock.lock().await;

        if let Err(err) = self.fallback.remove(SESSION_KEY).await {
            warn!("failed to clear fallback session snapshot: {err}");
        }

        self.store.remove(SESSION_KEY).await?;
        debug!("session snapshot cleared");
        Ok(())
    }
}
