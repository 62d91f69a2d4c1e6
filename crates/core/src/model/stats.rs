use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StatsError {
    #[error("correct answers ({correct}) exceed total answered ({total})")]
    CountMismatch { correct: u32, total: u32 },
}

//
// ─── SCORING RULES ────────────────────────────────────────────────────────────
//

/// Point values applied when an answer is recorded.
///
/// The defaults reproduce the shipped game: +10 per correct answer, -5 per
/// incorrect answer (never below zero), no streak bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringRules {
    base_points: u32,
    wrong_penalty: u32,
    streak_bonus: u32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            base_points: 10,
            wrong_penalty: 5,
            streak_bonus: 0,
        }
    }
}

impl ScoringRules {
    #[must_use]
    pub fn new(base_points: u32, wrong_penalty: u32, streak_bonus: u32) -> Self {
        Self {
            base_points,
            wrong_penalty,
            streak_bonus,
        }
    }

    /// Points awarded for a correct answer.
    #[must_use]
    pub fn base_points(&self) -> u32 {
        self.base_points
    }

    /// Points removed for an incorrect answer (clamped at a zero score).
    #[must_use]
    pub fn wrong_penalty(&self) -> u32 {
        self.wrong_penalty
    }

    /// Extra points per correct answer on top of `base_points`.
    #[must_use]
    pub fn streak_bonus(&self) -> u32 {
        self.streak_bonus
    }
}

//
// ─── SESSION STATS ────────────────────────────────────────────────────────────
//

/// Immutable statistics snapshot for one quiz session.
///
/// [`SessionStats::record_answer`] returns a fresh snapshot and leaves the
/// previous one untouched, so callers can diff consecutive states or throw
/// them away freely. A snapshot lives only as long as its session; the
/// leaderboard keeps its own copies of the final values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    score: u32,
    streak: u32,
    correct_answers: u32,
    total_answered: u32,
    best_reaction_time_ms: Option<u32>,
}

impl SessionStats {
    /// Fresh snapshot with everything at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate a snapshot from persisted storage.
    ///
    /// `best_reaction_time_ms` is `None` when no answer has been recorded
    /// yet (stored as `0` on the wire).
    ///
    /// # Errors
    ///
    /// Returns `StatsError::CountMismatch` if `correct_answers` exceeds
    /// `total_answered`.
    pub fn from_persisted(
        score: u32,
        streak: u32,
        correct_answers: u32,
        total_answered: u32,
        best_reaction_time_ms: Option<u32>,
    ) -> Result<Self, StatsError> {
        if correct_answers > total_answered {
            return Err(StatsError::CountMismatch {
                correct: correct_answers,
                total: total_answered,
            });
        }

        Ok(Self {
            score,
            streak,
            correct_answers,
            total_answered,
            best_reaction_time_ms,
        })
    }

    /// Applies one answered question and returns the next snapshot.
    ///
    /// A correct answer adds `base_points` (plus any streak bonus) and
    /// extends the streak; an incorrect one subtracts `wrong_penalty`,
    /// clamped so the score never drops below zero, and resets the streak.
    /// The best reaction time only ever decreases once set.
    ///
    /// `reaction_time_ms` is elapsed wall-clock time measured by the caller;
    /// both inputs are assumed pre-validated, so this never fails.
    #[must_use]
    pub fn record_answer(
        &self,
        is_correct: bool,
        reaction_time_ms: u32,
        rules: &ScoringRules,
    ) -> SessionStats {
        let total_answered = self.total_answered.saturating_add(1);
        let correct_answers = if is_correct {
            self.correct_answers.saturating_add(1)
        } else {
            self.correct_answers
        };
        let streak = if is_correct {
            self.streak.saturating_add(1)
        } else {
            0
        };

        let score = if is_correct {
            self.score
                .saturating_add(rules.base_points())
                .saturating_add(rules.streak_bonus())
        } else {
            self.score.saturating_sub(rules.wrong_penalty())
        };

        let best_reaction_time_ms = Some(match self.best_reaction_time_ms {
            None => reaction_time_ms,
            Some(best) => best.min(reaction_time_ms),
        });

        Self {
            score,
            streak,
            correct_answers,
            total_answered,
            best_reaction_time_ms,
        }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Consecutive correct answers since the last miss.
    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn total_answered(&self) -> u32 {
        self.total_answered
    }

    /// Fastest recorded reaction time, or `None` before the first answer.
    #[must_use]
    pub fn best_reaction_time_ms(&self) -> Option<u32> {
        self.best_reaction_time_ms
    }

    /// Percentage of correct answers, rounded; `0` before the first answer.
    #[must_use]
    pub fn accuracy(&self) -> u8 {
        accuracy_percent(self.correct_answers, self.total_answered)
    }
}

/// `round(100 × correct / total)` without going through floats; `0` when
/// `total` is zero.
#[must_use]
pub fn accuracy_percent(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = u64::from(correct.min(total));
    let total = u64::from(total);
    let rounded = (correct * 100 + total / 2) / total;
    u8::try_from(rounded).unwrap_or(100)
}
