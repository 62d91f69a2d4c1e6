use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use thiserror::Error;

use crate::model::ids::EntryId;

/// Maximum number of entries the ranking keeps.
pub const MAX_ENTRIES: usize = 10;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LeaderboardEntryError {
    #[error("accuracy must be at most 100, got {0}")]
    AccuracyOutOfRange(u8),

    #[error("completed rounds ({completed}) exceed total rounds ({total})")]
    RoundCountMismatch { completed: u32, total: u32 },

    #[error("invalid persisted entry id: {0}")]
    InvalidId(String),
}

//
// ─── QUIZ RESULT ──────────────────────────────────────────────────────────────
//

/// End-of-session result waiting to be saved to the leaderboard.
///
/// `user_name` is the label typed on the results screen; when absent or
/// blank the entry falls back to `"{topic} quiz"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    pub user_name: Option<String>,
    pub score: u32,
    pub best_reaction_time_ms: Option<u32>,
    pub accuracy: u8,
    pub topic: String,
    pub completed_rounds: u32,
    pub total_rounds: u32,
}

//
// ─── LEADERBOARD ENTRY ────────────────────────────────────────────────────────
//

/// One persisted leaderboard row, immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    id: EntryId,
    user_name: String,
    score: u32,
    best_reaction_time_ms: Option<u32>,
    accuracy: u8,
    topic: String,
    completed_rounds: u32,
    total_rounds: u32,
    timestamp: DateTime<Utc>,
}

impl LeaderboardEntry {
    /// Builds an entry from a finished session result.
    ///
    /// A missing or blank user name falls back to `"{topic} quiz"`.
    #[must_use]
    pub fn from_result(id: EntryId, result: &QuizResult, timestamp: DateTime<Utc>) -> Self {
        let user_name = match &result.user_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("{} quiz", result.topic),
        };

        Self {
            id,
            user_name,
            score: result.score,
            best_reaction_time_ms: result.best_reaction_time_ms,
            accuracy: result.accuracy,
            topic: result.topic.clone(),
            completed_rounds: result.completed_rounds,
            total_rounds: result.total_rounds,
            timestamp,
        }
    }

    /// Rehydrates an entry from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardEntryError` if `accuracy` exceeds 100 or
    /// `completed_rounds` exceeds `total_rounds`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: EntryId,
        user_name: String,
        score: u32,
        best_reaction_time_ms: Option<u32>,
        accuracy: u8,
        topic: String,
        completed_rounds: u32,
        total_rounds: u32,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, LeaderboardEntryError> {
        if accuracy > 100 {
            return Err(LeaderboardEntryError::AccuracyOutOfRange(accuracy));
        }
        if completed_rounds > total_rounds {
            return Err(LeaderboardEntryError::RoundCountMismatch {
                completed: completed_rounds,
                total: total_rounds,
            });
        }

        Ok(Self {
            id,
            user_name,
            score,
            best_reaction_time_ms,
            accuracy,
            topic,
            completed_rounds,
            total_rounds,
            timestamp,
        })
    }

    #[must_use]
    pub fn id(&self) -> EntryId {
        self.id
    }

    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Fastest reaction time of the session, `None` when never measured.
    #[must_use]
    pub fn best_reaction_time_ms(&self) -> Option<u32> {
        self.best_reaction_time_ms
    }

    #[must_use]
    pub fn accuracy(&self) -> u8 {
        self.accuracy
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn completed_rounds(&self) -> u32 {
        self.completed_rounds
    }

    #[must_use]
    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Ranking order: higher score first, then faster best reaction time.
    ///
    /// An unmeasured reaction time compares as 0 ms, matching its wire
    /// representation.
    #[must_use]
    pub fn ranking_cmp(&self, other: &Self) -> Ordering {
        other.score.cmp(&self.score).then_with(|| {
            self.best_reaction_time_ms
                .unwrap_or(0)
                .cmp(&other.best_reaction_time_ms.unwrap_or(0))
        })
    }
}

/// Sorts a ranking in place and truncates it to [`MAX_ENTRIES`].
///
/// The sort is stable, so entries tied on both score and best reaction time
/// keep their insertion order.
pub fn rank_entries(entries: &mut Vec<LeaderboardEntry>) {
    entries.sort_by(LeaderboardEntry::ranking_cmp);
    entries.truncate(MAX_ENTRIES);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn result(score: u32, best_rt: u32) -> QuizResult {
        QuizResult {
            user_name: None,
            score,
            best_reaction_time_ms: Some(best_rt),
            accuracy: 80,
            topic: "python".to_string(),
            completed_rounds: 5,
            total_rounds: 5,
        }
    }

    fn entry(score: u32, best_rt: u32) -> LeaderboardEntry {
        LeaderboardEntry::from_result(EntryId::generate(), &result(score, best_rt), fixed_now())
    }

    #[test]
    fn blank_name_falls_back_to_topic() {
        let mut with_blank = result(10, 1000);
        with_blank.user_name = Some("   ".to_string());
        let entry = LeaderboardEntry::from_result(EntryId::generate(), &with_blank, fixed_now());
        assert_eq!(entry.user_name(), "python quiz");

        let mut with_name = result(10, 1000);
        with_name.user_name = Some("speedrun".to_string());
        let entry = LeaderboardEntry::from_result(EntryId::generate(), &with_name, fixed_now());
        assert_eq!(entry.user_name(), "speedrun");
    }

    #[test]
    fn ranking_prefers_score_then_reaction_time() {
        // A{60, 5000ms}, B{60, 3000ms}, C{80, 9000ms} must rank [C, B, A].
        let a = entry(60, 5000);
        let b = entry(60, 3000);
        let c = entry(80, 9000);

        let mut entries = vec![a.clone(), b.clone(), c.clone()];
        rank_entries(&mut entries);

        assert_eq!(entries[0].id(), c.id());
        assert_eq!(entries[1].id(), b.id());
        assert_eq!(entries[2].id(), a.id());
    }

    #[test]
    fn full_ties_keep_insertion_order() {
        let first = entry(50, 2000);
        let second = entry(50, 2000);

        let mut entries = vec![first.clone(), second.clone()];
        rank_entries(&mut entries);

        assert_eq!(entries[0].id(), first.id());
        assert_eq!(entries[1].id(), second.id());
    }

    #[test]
    fn ranking_caps_at_ten_entries() {
        let mut entries: Vec<_> = (0..15).map(|i| entry(i * 10, 1000)).collect();
        rank_entries(&mut entries);

        assert_eq!(entries.len(), MAX_ENTRIES);
        // The survivors are the ten highest scores, best first.
        assert_eq!(entries[0].score(), 140);
        assert_eq!(entries[MAX_ENTRIES - 1].score(), 50);
    }

    #[test]
    fn unmeasured_reaction_time_sorts_as_zero() {
        let mut no_rt = result(60, 0);
        no_rt.best_reaction_time_ms = None;
        let unmeasured =
            LeaderboardEntry::from_result(EntryId::generate(), &no_rt, fixed_now());
        let measured = entry(60, 100);

        let mut entries = vec![measured.clone(), unmeasured.clone()];
        rank_entries(&mut entries);
        assert_eq!(entries[0].id(), unmeasured.id());
    }

    #[test]
    fn from_persisted_rejects_bad_accuracy() {
        let err = LeaderboardEntry::from_persisted(
            EntryId::generate(),
            "name".to_string(),
            10,
            Some(1000),
            101,
            "python".to_string(),
            5,
            5,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, LeaderboardEntryError::AccuracyOutOfRange(101));
    }

    #[test]
    fn from_persisted_rejects_round_mismatch() {
        let err = LeaderboardEntry::from_persisted(
            EntryId::generate(),
            "name".to_string(),
            10,
            Some(1000),
            80,
            "python".to_string(),
            6,
            5,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            LeaderboardEntryError::RoundCountMismatch {
                completed: 6,
                total: 5
            }
        );
    }
}
