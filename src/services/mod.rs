//! Service layer: pairing, session tracking and score aggregation.

pub mod pair_selector;
pub mod score_service;
pub mod session_service;

pub use pair_selector::{PairPools, PairSelector, SelfPairPolicy};
pub use score_service::{Export, ExportFormat, ScoreService};
pub use session_service::{SessionRetention, SessionService};
