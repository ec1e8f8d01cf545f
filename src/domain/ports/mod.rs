//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that infrastructure adapters must implement:
//! - ScoreRepository: Persistence of the aggregate store
//! - ImagePoolProvider: Discovery of the similar and different image pools
//!
//! These traits keep the pairing and aggregation logic independent of the
//! filesystem layout and storage format.

pub mod image_pool;
pub mod score_repository;

pub use image_pool::ImagePoolProvider;
pub use score_repository::ScoreRepository;
