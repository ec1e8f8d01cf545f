//! image-compare - paired-image similarity experiments
//!
//! Participants are shown a sequence of image pairs and rate each one as
//! similar or different. Ratings and response times are folded into running
//! per-image, per-pair and per-user aggregates that are persisted as a single
//! JSON document and can be exported as JSON or CSV.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, ports and errors
//! - **Service Layer** (`services`): pair selection, scoring and sessions
//! - **Infrastructure Layer** (`infrastructure`): config, logging, storage, image folders
//! - **Adapters** (`adapters`): HTTP server for the comparison UI
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```
//! use image_compare::services::{PairPools, PairSelector, SelfPairPolicy};
//! use rand::SeedableRng;
//!
//! let similar = vec!["s1.png".to_string(), "s2.png".to_string()];
//! let different = vec!["d1.png".to_string(), "d2.png".to_string(), "d3.png".to_string()];
//! let pools = PairPools::from_images(&similar, &different).unwrap();
//!
//! let selector = PairSelector::new(4).with_self_pairs(SelfPairPolicy::Disabled);
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//! let pairs = selector.select(&pools, &mut rng).unwrap();
//! assert_eq!(pairs.len(), 4);
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    AggregateStore, Config, ImagePair, ImageScore, Judgment, JudgmentSubmission, PairKey,
    PairScore, Rating, Session, SessionState, UserScore,
};
pub use domain::ports::{ImagePoolProvider, ScoreRepository};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{PairSelector, ScoreService, SessionService};
