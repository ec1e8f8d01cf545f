//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use image_compare::infrastructure::images::StaticImagePool;
use image_compare::infrastructure::storage::InMemoryScoreRepository;
use image_compare::services::{PairSelector, ScoreService, SelfPairPolicy, SessionService};

/// Create a temporary directory for test isolation
///
/// Returns a TempDir that will be cleaned up when dropped.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Path of a scores document inside a fresh temporary directory
pub fn temp_scores_path() -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let path = dir.path().join("data").join("scores.json");
    (dir, path)
}

/// Write empty placeholder image files into `root/folder`
pub fn write_images(root: &Path, folder: &str, names: &[&str]) {
    let dir = root.join(folder);
    std::fs::create_dir_all(&dir).expect("Failed to create image folder");
    for name in names {
        std::fs::write(dir.join(name), b"\x89PNG").expect("Failed to write image");
    }
}

/// `n` image identifiers under `prefix`
pub fn image_names(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("/images/{prefix}/{i:03}.png")).collect()
}

/// Session service over fixed pools without self-pairs
pub fn session_service(similar: usize, different: usize, target: usize) -> Arc<SessionService> {
    let pool = StaticImagePool::new(image_names("s", similar), image_names("d", different));
    Arc::new(SessionService::new(
        Arc::new(pool),
        PairSelector::new(target).with_self_pairs(SelfPairPolicy::Disabled),
    ))
}

/// Score service backed by an in-memory repository
pub fn score_service() -> (Arc<InMemoryScoreRepository>, Arc<ScoreService<InMemoryScoreRepository>>) {
    let repository = Arc::new(InMemoryScoreRepository::new());
    let service = Arc::new(ScoreService::with_store(
        repository.clone(),
        Default::default(),
    ));
    (repository, service)
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
