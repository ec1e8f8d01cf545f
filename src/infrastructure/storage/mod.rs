//! Score persistence adapters
//!
//! - `JsonFileScoreRepository`: whole-document JSON file, rewritten on every save
//! - `InMemoryScoreRepository`: process-local store for tests and dry runs

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileScoreRepository;
pub use memory::InMemoryScoreRepository;
