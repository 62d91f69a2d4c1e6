use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use quiz_core::model::{
    EntryId, LeaderboardEntry, LeaderboardEntryError, QuizResult, rank_entries,
};
use storage::repository::{InMemoryStore, KeyValueRepository};

use crate::Clock;
use crate::error::LeaderboardError;

/// Storage key under which the serialized ranking lives.
pub const LEADERBOARD_KEY: &str = "focus_game_leaderboard";

//
// ─── WIRE FORMAT ──────────────────────────────────────────────────────────────
//

/// Persisted shape for one ranking row.
///
/// This service is the sole owner of the format: a flat JSON object with
/// camelCase keys, `bestRT` stored as `0` when no reaction time was
/// measured, and an RFC 3339 timestamp.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryRecord {
    id: String,
    user_name: String,
    score: u32,
    #[serde(rename = "bestRT")]
    best_rt: u32,
    accuracy: u8,
    topic: String,
    completed_rounds: u32,
    total_rounds: u32,
    timestamp: DateTime<Utc>,
}

impl EntryRecord {
    fn from_entry(entry: &LeaderboardEntry) -> Self {
        Self {
            id: entry.id().to_string(),
            user_name: entry.user_name().to_owned(),
            score: entry.score(),
            best_rt: entry.best_reaction_time_ms().unwrap_or(0),
            accuracy: entry.accuracy(),
            topic: entry.topic().to_owned(),
            completed_rounds: entry.completed_rounds(),
            total_rounds: entry.total_rounds(),
            timestamp: entry.timestamp(),
        }
    }

    fn into_entry(self) -> Result<LeaderboardEntry, LeaderboardEntryError> {
        let id = self
            .id
            .parse::<EntryId>()
            .map_err(|_| LeaderboardEntryError::InvalidId(self.id.clone()))?;
        let best_rt = if self.best_rt == 0 {
            None
        } else {
            Some(self.best_rt)
        };

        LeaderboardEntry::from_persisted(
            id,
            self.user_name,
            self.score,
            best_rt,
            self.accuracy,
            self.topic,
            self.completed_rounds,
            self.total_rounds,
            self.timestamp,
        )
    }
}

fn encode_entries(entries: &[LeaderboardEntry]) -> Result<String, serde_json::Error> {
    let records: Vec<EntryRecord> = entries.iter().map(EntryRecord::from_entry).collect();
    serde_json::to_string(&records)
}

fn decode_entries(payload: &str) -> Result<Vec<LeaderboardEntry>, serde_json::Error> {
    let records: Vec<EntryRecord> = serde_json::from_str(payload)?;
    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        match record.into_entry() {
            Ok(entry) => entries.push(entry),
            // One bad row should not take the whole board down.
            Err(err) => warn!("skipping invalid leaderboard row: {err}"),
        }
    }
    Ok(entries)
}

//
// ─── SERVICE ──────────────────────────────────────────────────────────────────
//

/// Capped, ordered ranking of the best sessions over a key-value backend.
///
/// When the backend misbehaves the service degrades to an in-process store
/// that lives until the process exits: saves land there instead of failing,
/// and reads fall back to it. Callers never see either substitution; only
/// [`LeaderboardService::clear`] reports backend failures.
pub struct LeaderboardService {
    clock: Clock,
    store: Arc<dyn KeyValueRepository>,
    fallback: InMemoryStore,
    write_lock: Mutex<()>,
}

impl LeaderboardService {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn KeyValueRepository>) -> Self {
        Self {
            clock,
            store,
            fallback: InMemoryStore::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Records a finished session on the leaderboard and returns the entry.
    ///
    /// The combined ranking is re-sorted (score descending, best reaction
    /// time ascending) and truncated to the top ten before persisting. The
    /// read-modify-write cycle is serialized against concurrent recorders,
    /// so no update is lost.
    pub async fn record_result(&self, result: &QuizResult) -> LeaderboardEntry {
        let _guard = self.write_lock.lock().await;

        let entry = LeaderboardEntry::from_result(EntryId::generate(), result, self.clock.now());

        let mut entries = self.read_entries().await;
        entries.push(entry.clone());
        rank_entries(&mut entries);

        match encode_entries(&entries) {
            Ok(payload) => {
                if let Err(err) = self.store.set(LEADERBOARD_KEY, &payload).await {
                    warn!("leaderboard write failed, keeping ranking in process memory: {err}");
                    if let Err(err) = self.fallback.set(LEADERBOARD_KEY, &payload).await {
                        warn!("fallback write failed, ranking update dropped: {err}");
                    }
                } else {
                    debug!(entries = entries.len(), "leaderboard persisted");
                }
            }
            Err(err) => warn!("failed to encode ranking, update dropped: {err}"),
        }

        entry
    }

    /// Current ranking, best session first (rank = position + 1).
    ///
    /// Read failures, an absent key, and undecodable payloads all fall back
    /// to the in-process store; absence of data yields an empty vector,
    /// never an error.
    pub async fn ranking(&self) -> Vec<LeaderboardEntry> {
        self.read_entries().await
    }

    /// Removes the persisted ranking and empties the in-process fallback.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Storage` if the backend delete fails. The
    /// fallback is cleared first regardless, so a reported failure refers to
    /// durable state only.
    pub async fn clear(&self) -> Result<(), LeaderboardError> {
        let _guard = self.write_lock.lock().await;

        if let Err(err) = self.fallback.remove(LEADERBOARD_KEY).await {
            warn!("failed to clear fallback ranking: {err}");
        }

        self.store.remove(LEADERBOARD_KEY).await?;
        debug!("leaderboard cleared");
        Ok(())
    }

    async fn read_entries(&self) -> Vec<LeaderboardEntry> {
        match self.store.get(LEADERBOARD_KEY).await {
            Ok(Some(payload)) => match decode_entries(&payload) {
                Ok(entries) => return entries,
                Err(err) => warn!("undecodable leaderboard payload, using fallback: {err}"),
            },
            Ok(None) => {}
            Err(err) => warn!("leaderboard read failed, using fallback: {err}"),
        }

        match self.fallback.get(LEADERBOARD_KEY).await {
            Ok(Some(payload)) => decode_entries(&payload).unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}
