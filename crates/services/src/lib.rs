#![forbid(unsafe_code)]

pub mod error;
pub mod game_services;
pub mod leaderboard;
pub mod session_store;

pub use quiz_core::Clock;

pub use error::{GameServicesError, LeaderboardError, SessionStoreError};
pub use game_services::GameServices;
pub use leaderboard::{LEADERBOARD_KEY, LeaderboardService};
pub use session_store::{SESSION_KEY, SessionStore};
