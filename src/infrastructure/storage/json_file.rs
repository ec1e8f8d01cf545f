use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::AggregateStore;
use crate::domain::ports::ScoreRepository;

/// Score repository backed by a single pretty-printed JSON document
///
/// Every save overwrites the file in full. The file is not re-read after the
/// initial load, so two processes sharing it will diverge and the last writer
/// wins.
#[derive(Debug, Clone)]
pub struct JsonFileScoreRepository {
    path: PathBuf,
}

impl JsonFileScoreRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ScoreRepository for JsonFileScoreRepository {
    async fn load(&self) -> DomainResult<Option<AggregateStore>> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DomainError::Storage(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };

        let store = serde_json::from_str(&raw).map_err(|e| {
            DomainError::Serialization(format!(
                "failed to parse {}: {e}",
                self.path.display()
            ))
        })?;
        Ok(Some(store))
    }

    async fn save(&self, store: &AggregateStore) -> DomainResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_string_pretty(store)?;
        fs::write(&self.path, data).await.map_err(|e| {
            DomainError::Storage(format!("failed to write {}: {e}", self.path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ImagePair, Judgment, Rating};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileScoreRepository::new(dir.path().join("scores.json"));
        assert!(repo.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_garbage_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.json");
        std::fs::write(&path, "{ not json").unwrap();

        let repo = JsonFileScoreRepository::new(&path);
        assert!(matches!(
            repo.load().await,
            Err(DomainError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileScoreRepository::new(dir.path().join("nested/data/scores.json"));

        let mut store = AggregateStore::new();
        store.record(
            &Judgment::new(ImagePair::new("a.png", "b.png"), Rating::Similar)
                .with_duration_ms(420.0)
                .with_user("carol"),
        );
        repo.save(&store).await.unwrap();

        let loaded = repo.load().await.unwrap().unwrap();
        assert_eq!(loaded, store);
    }

    #[tokio::test]
    async fn test_save_writes_named_sections() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileScoreRepository::new(dir.path().join("scores.json"));
        repo.save(&AggregateStore::new()).await.unwrap();

        let raw = std::fs::read_to_string(repo.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"imageScores": {}, "pairScores": {}, "userScores": {}})
        );
    }
}
