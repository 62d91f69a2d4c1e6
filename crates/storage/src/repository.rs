use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// String-keyed key-value contract backing all persisted game state.
///
/// Values are opaque strings; whichever service writes a key is the sole
/// owner of that key's format. Operations are async because real backends
/// may suspend, and fallible because the backend may be unavailable.
#[async_trait]
pub trait KeyValueRepository: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value stored under `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete cannot be executed.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory key-value store for tests, prototyping, and in-process
/// fallback state.
///
/// Holds its entries for the lifetime of the process; nothing survives a
/// restart. Constructed explicitly wherever fallback state is needed, so a
/// test can reset it by dropping the instance.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl KeyValueRepository for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Aggregates the key-value backend behind a trait object for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub kv: Arc<dyn KeyValueRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            kv: Arc::new(InMemoryStore::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_roundtrip() {
        let store = InMemoryStore::new();
        store.set("ranking", "[]").await.unwrap();
        assert_eq!(store.get("ranking").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn set_replaces_previous_value() {
        let store = InMemoryStore::new();
        store.set("ranking", "old").await.unwrap();
        store.set("ranking", "new").await.unwrap();
        assert_eq!(store.get("ranking").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let store = InMemoryStore::new();
        assert!(store.get("absent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = InMemoryStore::new();
        store.set("ranking", "[]").await.unwrap();
        store.remove("ranking").await.unwrap();
        store.remove("ranking").await.unwrap();
        assert!(store.get("ranking").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clones_share_the_same_entries() {
        let store = InMemoryStore::new();
        let alias = store.clone();
        store.set("ranking", "[]").await.unwrap();
        assert_eq!(alias.get("ranking").await.unwrap().as_deref(), Some("[]"));
    }
}
