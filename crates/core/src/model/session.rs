use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::leaderboard::QuizResult;
use crate::model::stats::{ScoringRules, SessionStats, StatsError};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("topic cannot be empty")]
    EmptyTopic,

    #[error("a session needs at least one round")]
    NoRounds,

    #[error("session already completed")]
    Completed,

    #[error("completed rounds ({completed}) exceed total rounds ({total})")]
    RoundCountMismatch { completed: u32, total: u32 },

    #[error(transparent)]
    Stats(#[from] StatsError),
}

//
// ─── PROGRESS ─────────────────────────────────────────────────────────────────
//

/// Aggregated view of session progress, useful for rendering headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total_rounds: u32,
    pub completed_rounds: u32,
    pub remaining: u32,
    pub is_complete: bool,
}

/// Outcome of one answered round: the judgment plus the snapshots a caller
/// needs to render feedback and the next header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub is_correct: bool,
    pub stats: SessionStats,
    pub progress: SessionProgress,
}

//
// ─── GAME SESSION ─────────────────────────────────────────────────────────────
//

/// One run through a fixed number of quiz rounds.
///
/// The session owns the running [`SessionStats`] and applies the scoring
/// rules per answer; it holds no I/O. Question content, answer judging, and
/// reaction-time measurement all happen in the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
    topic: String,
    mission: String,
    total_rounds: u32,
    completed_rounds: u32,
    stats: SessionStats,
    rules: ScoringRules,
    started_at: DateTime<Utc>,
}

impl GameSession {
    /// Creates a session with the default scoring rules.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyTopic` or `SessionError::NoRounds` on
    /// invalid inputs.
    pub fn new(
        topic: impl Into<String>,
        mission: impl Into<String>,
        total_rounds: u32,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        Self::with_rules(topic, mission, total_rounds, ScoringRules::default(), started_at)
    }

    /// Creates a session with explicit scoring rules.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyTopic` or `SessionError::NoRounds` on
    /// invalid inputs.
    pub fn with_rules(
        topic: impl Into<String>,
        mission: impl Into<String>,
        total_rounds: u32,
        rules: ScoringRules,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(SessionError::EmptyTopic);
        }
        if total_rounds == 0 {
            return Err(SessionError::NoRounds);
        }

        Ok(Self {
            topic,
            mission: mission.into(),
            total_rounds,
            completed_rounds: 0,
            stats: SessionStats::new(),
            rules,
            started_at,
        })
    }

    /// Rehydrates an in-progress session from a persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the snapshot violates the session
    /// invariants (empty topic, zero rounds, more completed rounds than
    /// total).
    pub fn from_persisted(
        topic: String,
        mission: String,
        total_rounds: u32,
        completed_rounds: u32,
        stats: SessionStats,
        rules: ScoringRules,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if completed_rounds > total_rounds {
            return Err(SessionError::RoundCountMismatch {
                completed: completed_rounds,
                total: total_rounds,
            });
        }

        let mut session = Self::with_rules(topic, mission, total_rounds, rules, started_at)?;
        session.completed_rounds = completed_rounds;
        session.stats = stats;
        Ok(session)
    }

    /// Applies one answered question and advances to the next round.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once every round has been answered.
    pub fn record_answer(
        &mut self,
        is_correct: bool,
        reaction_time_ms: u32,
    ) -> Result<AnswerFeedback, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }

        self.stats = self
            .stats
            .record_answer(is_correct, reaction_time_ms, &self.rules);
        self.completed_rounds += 1;

        Ok(AnswerFeedback {
            is_correct,
            stats: self.stats,
            progress: self.progress(),
        })
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn mission(&self) -> &str {
        &self.mission
    }

    #[must_use]
    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    #[must_use]
    pub fn completed_rounds(&self) -> u32 {
        self.completed_rounds
    }

    /// 1-based round currently being played; stays at the last round once
    /// the session is complete.
    #[must_use]
    pub fn current_round(&self) -> u32 {
        (self.completed_rounds + 1).min(self.total_rounds)
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    #[must_use]
    pub fn rules(&self) -> ScoringRules {
        self.rules
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_rounds >= self.total_rounds
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total_rounds: self.total_rounds,
            completed_rounds: self.completed_rounds,
            remaining: self.total_rounds - self.completed_rounds,
            is_complete: self.is_complete(),
        }
    }

    /// Snapshot of this session as a result ready for the leaderboard.
    ///
    /// Can be taken mid-session; `completed_rounds` then reflects how far
    /// the run got.
    #[must_use]
    pub fn to_result(&self, user_name: Option<String>) -> QuizResult {
        QuizResult {
            user_name,
            score: self.stats.score(),
            best_reaction_time_ms: self.stats.best_reaction_time_ms(),
            accuracy: self.stats.accuracy(),
            topic: self.topic.clone(),
            completed_rounds: self.completed_rounds,
            total_rounds: self.total_rounds,
        }
    }
}
