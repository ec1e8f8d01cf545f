//! Domain models

pub mod config;
pub mod judgment;
pub mod pair;
pub mod score;
pub mod session;
pub mod store;

pub use config::{
    Config, ImagesConfig, LoggingConfig, ServerConfig, SessionConfig, StorageConfig,
};
pub use judgment::{Judgment, JudgmentSubmission, Rating};
pub use pair::{ImagePair, PairKey, PAIR_KEY_SEPARATOR};
pub use score::{ImageScore, PairScore, ResponseTime, UserScore};
pub use session::{Session, SessionState};
pub use store::{AggregateStore, PairRow, RecordOutcome};
