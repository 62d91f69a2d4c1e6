mod ids;
mod leaderboard;
mod session;
mod stats;

pub use ids::{EntryId, ParseEntryIdError};
pub use leaderboard::{
    LeaderboardEntry, LeaderboardEntryError, MAX_ENTRIES, QuizResult, rank_entries,
};
pub use session::{AnswerFeedback, GameSession, SessionError, SessionProgress};
pub use stats::{ScoringRules, SessionStats, StatsError, accuracy_percent};
