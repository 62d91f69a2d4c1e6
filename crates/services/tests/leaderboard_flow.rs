use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{MAX_ENTRIES, QuizResult};
use quiz_core::time::fixed_clock;
use services::LeaderboardService;
use storage::repository::{InMemoryStore, KeyValueRepository, Storage, StorageError};

fn result(name: &str, score: u32, best_rt: u32, accuracy: u8) -> QuizResult {
    QuizResult {
        user_name: Some(name.to_string()),
        score,
        best_reaction_time_ms: Some(best_rt),
        accuracy,
        topic: "python".to_string(),
        completed_rounds: 5,
        total_rounds: 5,
    }
}

/// Key-value double whose operations can be switched off individually.
struct FlakyStore {
    inner: InMemoryStore,
    fail_reads: bool,
    fail_writes: bool,
    fail_removes: bool,
}

impl FlakyStore {
    fn offline() -> Self {
        Self {
            inner: InMemoryStore::new(),
            fail_reads: true,
            fail_writes: true,
            fail_removes: true,
        }
    }

    fn failing_removes_only() -> Self {
        Self {
            inner: InMemoryStore::new(),
            fail_reads: false,
            fail_writes: false,
            fail_removes: true,
        }
    }
}

#[async_trait]
impl KeyValueRepository for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads {
            return Err(StorageError::Connection("store offline".to_string()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Connection("store offline".to_string()));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_removes {
            return Err(StorageError::Connection("store offline".to_string()));
        }
        self.inner.remove(key).await
    }
}

#[tokio::test]
async fn ranking_orders_by_score_then_reaction_time() {
    let storage = Storage::in_memory();
    let service = LeaderboardService::new(fixed_clock(), Arc::clone(&storage.kv));

    let a = service.record_result(&result("a", 60, 5000, 80)).await;
    let b = service.record_result(&result("b", 60, 3000, 80)).await;
    let c = service.record_result(&result("c", 80, 9000, 100)).await;

    let ranking = service.ranking().await;
    assert_eq!(ranking.len(), 3);
    assert_eq!(ranking[0].id(), c.id());
    assert_eq!(ranking[1].id(), b.id());
    assert_eq!(ranking[2].id(), a.id());
}

#[tokio::test]
async fn ranking_keeps_only_the_ten_best() {
    let storage = Storage::in_memory();
    let service = LeaderboardService::new(fixed_clock(), Arc::clone(&storage.kv));

    for i in 0..15_u32 {
        service
            .record_result(&result(&format!("run {i}"), i * 10, 1000, 50))
            .await;
    }

    let ranking = service.ranking().await;
    assert_eq!(ranking.len(), MAX_ENTRIES);
    // Exactly the ten highest scores survive, best first.
    let scores: Vec<u32> = ranking.iter().map(|e| e.score()).collect();
    assert_eq!(
        scores,
        vec![140, 130, 120, 110, 100, 90, 80, 70, 60, 50]
    );
}

#[tokio::test]
async fn recorded_fields_survive_the_roundtrip() {
    let storage = Storage::in_memory();
    let service = LeaderboardService::new(fixed_clock(), Arc::clone(&storage.kv));

    let entry = service.record_result(&result("ace", 45, 1234, 60)).await;
    let ranking = service.ranking().await;

    assert_eq!(ranking.len(), 1);
    let restored = &ranking[0];
    assert_eq!(restored.id(), entry.id());
    assert_eq!(restored.user_name(), "ace");
    assert_eq!(restored.score(), 45);
    assert_eq!(restored.best_reaction_time_ms(), Some(1234));
    assert_eq!(restored.accuracy(), 60);
    assert_eq!(restored.topic(), "python");
    assert_eq!(restored.completed_rounds(), 5);
    assert_eq!(restored.total_rounds(), 5);
}

#[tokio::test]
async fn blank_name_defaults_to_topic_quiz() {
    let storage = Storage::in_memory();
    let service = LeaderboardService::new(fixed_clock(), Arc::clone(&storage.kv));

    let mut unnamed = result("", 10, 1000, 40);
    unnamed.user_name = None;
    let entry = service.record_result(&unnamed).await;
    assert_eq!(entry.user_name(), "python quiz");
}

#[tokio::test]
async fn offline_store_falls_back_invisibly() {
    let service = LeaderboardService::new(fixed_clock(), Arc::new(FlakyStore::offline()));

    // recordResult must still hand back the created entry...
    let entry = service.record_result(&result("ace", 60, 1500, 80)).await;
    assert_eq!(entry.user_name(), "ace");

    // ...and the ranking must serve it from the in-process fallback.
    let ranking = service.ranking().await;
    assert_eq!(ranking.len(), 1);
    assert_eq!(ranking[0].id(), entry.id());

    // The fallback obeys the same ordering and cap rules.
    for i in 0..12_u32 {
        service
            .record_result(&result(&format!("run {i}"), i * 5, 2000, 50))
            .await;
    }
    let ranking = service.ranking().await;
    assert_eq!(ranking.len(), MAX_ENTRIES);
    assert_eq!(ranking[0].score(), 60);
}

#[tokio::test]
async fn clear_empties_the_board() {
    let storage = Storage::in_memory();
    let service = LeaderboardService::new(fixed_clock(), Arc::clone(&storage.kv));

    service.record_result(&result("ace", 60, 1500, 80)).await;
    service.clear().await.unwrap();

    assert!(service.ranking().await.is_empty());
    assert!(storage
        .kv
        .get(services::LEADERBOARD_KEY)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn clear_failure_is_surfaced_but_fallback_still_cleared() {
    let service =
        LeaderboardService::new(fixed_clock(), Arc::new(FlakyStore::failing_removes_only()));

    service.record_result(&result("ace", 60, 1500, 80)).await;
    assert_eq!(service.ranking().await.len(), 1);

    // The backend delete fails, and unlike every other operation this one
    // must say so.
    assert!(service.clear().await.is_err());
}

#[tokio::test]
async fn recovery_after_outage_reads_durable_state_again() {
    let durable = InMemoryStore::new();
    let service = LeaderboardService::new(fixed_clock(), Arc::new(durable.clone()));

    service.record_result(&result("ace", 60, 1500, 80)).await;

    // A second service over the same backend sees the persisted board;
    // nothing was stranded in the first service's fallback.
    let fresh = LeaderboardService::new(fixed_clock(), Arc::new(durable));
    let ranking = fresh.ranking().await;
    assert_eq!(ranking.len(), 1);
    assert_eq!(ranking[0].user_name(), "ace");
}
