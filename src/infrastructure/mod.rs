//! Infrastructure layer
//!
//! Adapters for the outside world:
//! - Configuration loading (figment)
//! - Logging setup (tracing)
//! - Score persistence (JSON file, in-memory)
//! - Image pool discovery (filesystem, static)

pub mod config;
pub mod images;
pub mod logging;
pub mod storage;
