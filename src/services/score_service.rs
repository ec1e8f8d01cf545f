//! Score service: owns the aggregate store and mirrors it to persistence.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::errors::DomainResult;
use crate::domain::models::{AggregateStore, Judgment, JudgmentSubmission, PairRow, RecordOutcome};
use crate::domain::ports::ScoreRepository;

/// Export representations of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Structured dump of all three mappings
    Json,
    /// Flattened pair table
    Csv,
}

impl ExportFormat {
    /// Parse a format flag; anything other than `csv` means JSON.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::to_lowercase).as_deref() {
            Some("csv") => Self::Csv,
            _ => Self::Json,
        }
    }
}

/// An export rendered in one of the [`ExportFormat`]s.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Export {
    Json(AggregateStore),
    Csv(String),
}

/// Process-wide owner of the aggregate store.
///
/// Every mutation goes through a single async mutex, and the persisted copy
/// is written while that lock is held, so a slower save can never overwrite
/// a newer snapshot.
pub struct ScoreService<R: ScoreRepository> {
    repository: Arc<R>,
    store: Mutex<AggregateStore>,
}

impl<R: ScoreRepository> ScoreService<R> {
    /// Load the persisted store once.
    ///
    /// Nothing persisted, or a document that cannot be read, both start from
    /// an empty store.
    pub async fn load(repository: Arc<R>) -> Self {
        let mut store = match repository.load().await {
            Ok(Some(store)) => store,
            Ok(None) => {
                tracing::info!("no persisted scores found, starting empty");
                AggregateStore::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load persisted scores, starting empty");
                AggregateStore::new()
            }
        };
        store.migrate();

        tracing::info!(
            images = store.image_scores.len(),
            pairs = store.pair_scores.len(),
            users = store.user_scores.len(),
            "score store loaded"
        );

        Self {
            repository,
            store: Mutex::new(store),
        }
    }

    /// Start from `store` without reading persistence.
    pub fn with_store(repository: Arc<R>, store: AggregateStore) -> Self {
        Self {
            repository,
            store: Mutex::new(store),
        }
    }

    /// Fold a judgment into the store and persist the whole store.
    ///
    /// Persistence failures are logged and swallowed: the in-memory store
    /// stays authoritative for the rest of the process.
    pub async fn record_judgment(&self, judgment: &Judgment) -> RecordOutcome {
        let mut store = self.store.lock().await;
        let outcome = store.record(judgment);

        tracing::debug!(
            pair = %outcome.pair_key,
            rating = judgment.rating.value(),
            duration_ms = ?judgment.duration_ms,
            user = judgment.user.as_deref().unwrap_or("-"),
            "recorded judgment"
        );

        if let Err(e) = self.repository.save(&store).await {
            tracing::error!(error = %e, "failed to persist scores");
        }
        outcome
    }

    /// Validate a raw submission and record it.
    pub async fn submit(&self, submission: &JudgmentSubmission) -> DomainResult<RecordOutcome> {
        let judgment = Judgment::from_submission(submission, chrono::Utc::now())?;
        Ok(self.record_judgment(&judgment).await)
    }

    /// Copy of the current store.
    pub async fn snapshot(&self) -> AggregateStore {
        self.store.lock().await.clone()
    }

    pub async fn pair_rows(&self) -> Vec<PairRow> {
        self.store.lock().await.pair_rows()
    }

    pub async fn export(&self, format: ExportFormat) -> Export {
        let store = self.store.lock().await;
        match format {
            ExportFormat::Json => Export::Json(store.clone()),
            ExportFormat::Csv => Export::Csv(store.to_csv()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ImagePair, PairKey, Rating};
    use crate::infrastructure::storage::InMemoryScoreRepository;

    fn judgment(a: &str, b: &str, rating: Rating, ms: f64) -> Judgment {
        Judgment::new(ImagePair::new(a, b), rating).with_duration_ms(ms)
    }

    #[tokio::test]
    async fn test_load_from_empty_repository() {
        let service = ScoreService::load(Arc::new(InMemoryScoreRepository::new())).await;
        assert!(service.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_record_persists_full_store() {
        let repo = Arc::new(InMemoryScoreRepository::new());
        let service = ScoreService::load(repo.clone()).await;

        service.record_judgment(&judgment("a.png", "b.png", Rating::Similar, 500.0)).await;
        service.record_judgment(&judgment("b.png", "a.png", Rating::Different, 1500.0)).await;

        let saved = repo.saved().await.expect("store should be persisted");
        let score = saved.pair_score(&PairKey::new("a.png", "b.png")).unwrap();
        assert_eq!((score.total, score.votes), (1, 2));
        assert_eq!(score.time.avg_time_ms, 1000);
        assert_eq!(repo.save_count(), 2);
    }

    #[tokio::test]
    async fn test_save_failure_is_swallowed() {
        let repo = Arc::new(InMemoryScoreRepository::failing());
        let service = ScoreService::load(repo.clone()).await;

        let outcome = service
            .record_judgment(&judgment("a", "b", Rating::Similar, 10.0))
            .await;
        assert_eq!(outcome.pair.votes, 1);
        assert_eq!(service.snapshot().await.pair_scores.len(), 1);
        assert!(repo.saved().await.is_none());
    }

    #[tokio::test]
    async fn test_submit_rejects_invalid_payload() {
        let repo = Arc::new(InMemoryScoreRepository::new());
        let service = ScoreService::load(repo.clone()).await;

        let submission = JudgmentSubmission {
            img_a: Some("a".to_string()),
            ..Default::default()
        };
        assert!(service.submit(&submission).await.is_err());
        assert!(service.snapshot().await.is_empty());
        assert_eq!(repo.save_count(), 0);
    }

    #[tokio::test]
    async fn test_export_formats() {
        let service = ScoreService::with_store(
            Arc::new(InMemoryScoreRepository::new()),
            AggregateStore::new(),
        );
        service.record_judgment(&judgment("a", "b", Rating::Similar, 10.0)).await;

        match service.export(ExportFormat::Csv).await {
            Export::Csv(csv) => assert_eq!(csv.lines().count(), 2),
            Export::Json(_) => panic!("expected csv"),
        }
        match service.export(ExportFormat::parse(Some("JSON"))).await {
            Export::Json(store) => assert_eq!(store.image_scores.len(), 2),
            Export::Csv(_) => panic!("expected json"),
        }
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!(ExportFormat::parse(Some("CSV")), ExportFormat::Csv);
        assert_eq!(ExportFormat::parse(Some("xml")), ExportFormat::Json);
        assert_eq!(ExportFormat::parse(None), ExportFormat::Json);
    }
}
