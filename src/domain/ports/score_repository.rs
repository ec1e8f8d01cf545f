use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::AggregateStore;

/// Repository trait for persisting the aggregate store
///
/// The store is always read and written as one document; there are no
/// incremental writes.
#[async_trait]
pub trait ScoreRepository: Send + Sync {
    /// Load the persisted store
    ///
    /// Returns `Ok(None)` when nothing has been persisted yet.
    ///
    /// # Errors
    /// Returns error if the persisted document exists but cannot be read or
    /// parsed
    async fn load(&self) -> DomainResult<Option<AggregateStore>>;

    /// Overwrite the persisted store with `store`
    async fn save(&self, store: &AggregateStore) -> DomainResult<()>;
}
