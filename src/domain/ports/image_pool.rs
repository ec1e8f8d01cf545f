use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Source of the two image pools used for pairing
///
/// Identifiers are opaque to the domain; adapters typically return URLs.
/// Both lists are returned in a stable, sorted order.
#[async_trait]
pub trait ImagePoolProvider: Send + Sync {
    /// Images that are pre-paired consecutively as "similar" comparisons
    async fn similar_images(&self) -> DomainResult<Vec<String>>;

    /// Images combined pairwise into "different" comparisons
    async fn different_images(&self) -> DomainResult<Vec<String>>;
}
