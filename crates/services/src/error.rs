//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `LeaderboardService`.
///
/// Read and write failures during normal play are recovered internally via
/// the in-process fallback store; only an explicit `clear` surfaces its
/// failure, since a silent partial reset would mislead the user.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LeaderboardError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SessionStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionStoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping game services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GameServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
