//! In-memory score repository.
//!
//! Keeps the last saved store in process memory. Useful for tests and for
//! running without touching the filesystem.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::AggregateStore;
use crate::domain::ports::ScoreRepository;

#[derive(Debug, Default)]
pub struct InMemoryScoreRepository {
    stored: RwLock<Option<AggregateStore>>,
    saves: AtomicUsize,
    fail_saves: bool,
}

impl InMemoryScoreRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `store` already persisted.
    pub fn with_store(store: AggregateStore) -> Self {
        Self {
            stored: RwLock::new(Some(store)),
            ..Self::default()
        }
    }

    /// A repository whose saves always fail.
    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    /// Last successfully saved store.
    pub async fn saved(&self) -> Option<AggregateStore> {
        self.stored.read().await.clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScoreRepository for InMemoryScoreRepository {
    async fn load(&self) -> DomainResult<Option<AggregateStore>> {
        Ok(self.stored.read().await.clone())
    }

    async fn save(&self, store: &AggregateStore) -> DomainResult<()> {
        if self.fail_saves {
            return Err(DomainError::Storage("save rejected".to_string()));
        }
        *self.stored.write().await = Some(store.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
