//! Session service: builds and tracks participant sessions.
//!
//! Sessions live only in process memory. Every create and restart runs a
//! fresh selection over the current image pools. Finished and idle sessions
//! are dropped once their retention window has passed.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::pair_selector::{random_distinct_pair, PairPools, PairSelector};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::config::MAX_SESSION_TARGET;
use crate::domain::models::{ImagePair, Session, SessionConfig};
use crate::domain::ports::ImagePoolProvider;

/// How long sessions are kept after their last update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRetention {
    pub finished: Duration,
    pub idle: Duration,
}

impl SessionRetention {
    pub fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        let window = if session.is_finished() {
            self.finished
        } else {
            self.idle
        };
        now - session.updated_at > window
    }
}

impl Default for SessionRetention {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for SessionRetention {
    fn from(config: &SessionConfig) -> Self {
        let secs = |s: u64| {
            i64::try_from(s)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX)
        };
        Self {
            finished: secs(config.finished_ttl_secs),
            idle: secs(config.idle_ttl_secs),
        }
    }
}

pub struct SessionService {
    pools: Arc<dyn ImagePoolProvider>,
    selector: PairSelector,
    retention: SessionRetention,
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl SessionService {
    pub fn new(pools: Arc<dyn ImagePoolProvider>, selector: PairSelector) -> Self {
        Self {
            pools,
            selector,
            retention: SessionRetention::default(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_retention(mut self, retention: SessionRetention) -> Self {
        self.retention = retention;
        self
    }

    pub fn selector(&self) -> PairSelector {
        self.selector
    }

    /// Current candidate pools.
    pub async fn pools(&self) -> DomainResult<PairPools> {
        PairPools::from_provider(self.pools.as_ref()).await
    }

    async fn select(&self, selector: PairSelector) -> DomainResult<Vec<ImagePair>> {
        let pools = self.pools().await?;
        let mut rng = rand::rng();
        selector.select(&pools, &mut rng)
    }

    /// One random pair of distinct images from the different pool.
    pub async fn next_pair(&self) -> DomainResult<ImagePair> {
        let images = self.pools.different_images().await?;
        let mut rng = rand::rng();
        random_distinct_pair(&images, &mut rng)
    }

    /// Create a session, optionally overriding the configured length.
    ///
    /// An override must lie in `1..=MAX_SESSION_TARGET`.
    pub async fn create(&self, target: Option<usize>) -> DomainResult<Session> {
        let selector = match target {
            Some(t) if t == 0 || t > MAX_SESSION_TARGET => {
                return Err(DomainError::ValidationFailed(format!(
                    "target must be between 1 and {MAX_SESSION_TARGET}, got {t}"
                )))
            }
            Some(t) => PairSelector::new(t).with_self_pairs(self.selector.self_pair_policy()),
            None => self.selector,
        };

        let pairs = self.select(selector).await?;
        let mut session = Session::new(pairs, selector.target());
        session.start();

        tracing::info!(
            session_id = %session.id,
            pairs = session.pairs.len(),
            session_target = session.target,
            "session created"
        );

        let mut sessions = self.sessions.write().await;
        Self::evict(&mut sessions, self.retention, Utc::now());
        sessions.insert(session.id, session.clone());
        Ok(session)
    }

    /// Drop every session whose retention window has passed at `now`.
    pub async fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        Self::evict(&mut sessions, self.retention, now)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn evict(
        sessions: &mut HashMap<Uuid, Session>,
        retention: SessionRetention,
        now: DateTime<Utc>,
    ) -> usize {
        let before = sessions.len();
        sessions.retain(|_, session| !retention.is_expired(session, now));
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = sessions.len(), "expired sessions dropped");
        }
        evicted
    }

    pub async fn get(&self, id: Uuid) -> DomainResult<Session> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(DomainError::SessionNotFound(id))
    }

    /// Count one answered pair.
    ///
    /// Check and update happen under one write lock, so of two concurrent
    /// calls for the last pair exactly one succeeds.
    pub async fn advance(&self, id: Uuid) -> DomainResult<Session> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or(DomainError::SessionNotFound(id))?;
        let state = session.advance()?;
        if session.is_finished() {
            tracing::info!(session_id = %id, answered = session.answered, "session finished");
        } else {
            tracing::debug!(session_id = %id, state = ?state, "session advanced");
        }
        Ok(session.clone())
    }

    /// Discard progress and select a new sequence.
    pub async fn restart(&self, id: Uuid) -> DomainResult<Session> {
        let target = self.get(id).await?.target;
        let selector =
            PairSelector::new(target).with_self_pairs(self.selector.self_pair_policy());
        let pairs = self.select(selector).await?;

        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or(DomainError::SessionNotFound(id))?;
        session.restart(pairs);
        session.start();
        tracing::info!(session_id = %id, "session restarted");
        Ok(session.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::SessionState;
    use crate::infrastructure::images::StaticImagePool;
    use crate::services::pair_selector::SelfPairPolicy;

    fn service(similar: usize, different: usize, target: usize) -> SessionService {
        let pool = StaticImagePool::new(
            (0..similar).map(|i| format!("s{i}.png")).collect(),
            (0..different).map(|i| format!("d{i}.png")).collect(),
        );
        SessionService::new(
            Arc::new(pool),
            PairSelector::new(target).with_self_pairs(SelfPairPolicy::Disabled),
        )
    }

    #[tokio::test]
    async fn test_session_with_few_pairs_finishes_early() {
        // 4 different images -> 6 pairs, target 10
        let service = service(0, 4, 10);
        let session = service.create(None).await.unwrap();
        assert_eq!(session.pairs.len(), 6);
        assert_eq!(session.state, SessionState::InProgress { answered: 0 });

        let mut last = session;
        for _ in 0..6 {
            last = service.advance(last.id).await.unwrap();
        }
        assert!(last.is_finished());
        assert_eq!(last.answered, 6);
        assert!(service.advance(last.id).await.is_err());
    }

    #[tokio::test]
    async fn test_restart_selects_again() {
        let service = service(4, 6, 5);
        let session = service.create(None).await.unwrap();
        service.advance(session.id).await.unwrap();

        let restarted = service.restart(session.id).await.unwrap();
        assert_eq!(restarted.answered, 0);
        assert_eq!(restarted.pairs.len(), 5);
    }

    #[tokio::test]
    async fn test_target_override() {
        let service = service(4, 6, 5);
        let session = service.create(Some(3)).await.unwrap();
        assert_eq!(session.target, 3);
        assert_eq!(session.pairs.len(), 3);
        assert!(service.create(Some(0)).await.is_err());
    }

    #[tokio::test]
    async fn test_next_pair_uses_different_pool() {
        let sparse = service(4, 1, 5);
        let service = service(4, 2, 5);
        let pair = service.next_pair().await.unwrap();
        assert!(!pair.is_self_pair());
        assert!(pair.img_a.starts_with('d') && pair.img_b.starts_with('d'));

        assert!(matches!(
            sparse.next_pair().await,
            Err(DomainError::NotEnoughImages { found: 1 })
        ));
    }

    #[tokio::test]
    async fn test_target_override_is_bounded() {
        let service = service(4, 6, 5);
        let err = service.create(Some(MAX_SESSION_TARGET + 1)).await.unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
        let err = service.create(Some(2_000_000)).await.unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
        assert_eq!(service.session_count().await, 0);

        let session = service.create(Some(MAX_SESSION_TARGET)).await.unwrap();
        assert_eq!(session.target, MAX_SESSION_TARGET);
        assert!(session.pairs.len() <= MAX_SESSION_TARGET);
    }

    #[tokio::test]
    async fn test_concurrent_advance_on_last_pair() {
        let service = Arc::new(service(0, 2, 5));
        let session = service.create(None).await.unwrap();
        assert_eq!(session.length(), 1);

        let (first, second) = tokio::join!(service.advance(session.id), service.advance(session.id));
        assert_eq!(
            [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
            1
        );
        assert_eq!(service.get(session.id).await.unwrap().answered, 1);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_pruned() {
        let retention = SessionRetention {
            finished: Duration::minutes(5),
            idle: Duration::hours(1),
        };
        let service = service(0, 2, 5).with_retention(retention);
        let finished = service.create(None).await.unwrap();
        service.advance(finished.id).await.unwrap();
        let open = service.create(Some(1)).await.unwrap();
        assert_eq!(service.session_count().await, 2);

        let now = Utc::now();
        assert_eq!(service.prune_expired(now).await, 0);

        assert_eq!(service.prune_expired(now + Duration::minutes(10)).await, 1);
        assert!(matches!(
            service.get(finished.id).await,
            Err(DomainError::SessionNotFound(_))
        ));
        assert!(service.get(open.id).await.is_ok());

        assert_eq!(service.prune_expired(now + Duration::hours(2)).await, 1);
        assert_eq!(service.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_drops_expired_sessions() {
        let retention = SessionRetention {
            finished: Duration::zero(),
            idle: Duration::hours(1),
        };
        let service = service(0, 2, 5).with_retention(retention);
        let first = service.create(None).await.unwrap();
        service.advance(first.id).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        service.create(None).await.unwrap();
        assert_eq!(service.session_count().await, 1);
        assert!(service.get(first.id).await.is_err());
    }

    #[test]
    fn test_retention_from_settings() {
        let config = SessionConfig {
            finished_ttl_secs: 60,
            idle_ttl_secs: u64::MAX,
            ..SessionConfig::default()
        };
        let retention = SessionRetention::from(&config);
        assert_eq!(retention.finished, Duration::seconds(60));
        assert!(retention.idle > Duration::days(365));
        assert_eq!(SessionRetention::default().idle, Duration::hours(24));
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let service = service(4, 6, 5);
        let err = service.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_not_enough_images() {
        let service = service(1, 0, 5);
        assert!(matches!(
            service.create(None).await,
            Err(DomainError::NotEnoughImages { found: 1 })
        ));
    }
}
