#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{InMemoryStore, KeyValueRepository, Storage, StorageError};
pub use sqlite::{SqliteInitError, SqliteRepository};
