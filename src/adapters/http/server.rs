//! Experiment HTTP server.
//!
//! Serves pair pools and sessions to the comparison UI, accepts judgments
//! and exposes the aggregated scores for download.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::models::{
    ImagePair, ImageScore, Judgment, JudgmentSubmission, PairScore, ServerConfig, Session,
    UserScore,
};
use crate::domain::ports::ScoreRepository;
use crate::services::{Export, ExportFormat, ScoreService, SessionService};

/// Configuration for the experiment HTTP server.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Whether to enable CORS.
    pub enable_cors: bool,
    /// Directory served under `images_prefix`.
    pub images_dir: PathBuf,
    /// URL prefix for static images.
    pub images_prefix: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            enable_cors: true,
            images_dir: PathBuf::from("public/images"),
            images_prefix: "/images".to_string(),
        }
    }
}

impl HttpConfig {
    pub fn from_settings(server: &ServerConfig, images_dir: PathBuf, images_prefix: &str) -> Self {
        Self {
            host: server.host.clone(),
            port: server.port,
            enable_cors: server.enable_cors,
            images_dir,
            images_prefix: images_prefix.to_string(),
        }
    }
}

/// Body of `POST /api/sessions`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub target: Option<usize>,
}

/// Query parameters for the scores export.
#[derive(Debug, Deserialize)]
pub struct ScoresQuery {
    #[serde(default)]
    pub format: Option<String>,
}

/// Response listing both candidate pools.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairsResponse {
    pub similar_pairs: Vec<ImagePair>,
    pub different_pairs: Vec<ImagePair>,
    pub count: usize,
}

/// A session together with its derived progress fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[serde(flatten)]
    pub session: Session,
    pub length: usize,
    pub finished: bool,
    pub current_pair: Option<ImagePair>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            length: session.length(),
            finished: session.is_finished(),
            current_pair: session.current_pair().cloned(),
            session,
        }
    }
}

/// Response to an accepted judgment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub status: &'static str,
    pub received: Value,
    pub image_scores: BTreeMap<String, ImageScore>,
    pub pair_scores: BTreeMap<String, PairScore>,
    pub user_scores: BTreeMap<String, UserScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionResponse>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
        }),
    )
}

fn domain_error(e: DomainError) -> ApiError {
    let (status, code) = match &e {
        DomainError::ValidationFailed(_) => (StatusCode::BAD_REQUEST, "INVALID_PAYLOAD"),
        DomainError::NotEnoughImages { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "NOT_ENOUGH_IMAGES")
        }
        DomainError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        DomainError::InvalidStateTransition { .. } => (StatusCode::CONFLICT, "INVALID_STATE"),
        DomainError::Storage(_) | DomainError::Serialization(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        }
    };
    if status.is_server_error() {
        tracing::error!(error = %e, code, "request failed");
    } else {
        tracing::debug!(error = %e, code, "request rejected");
    }
    api_error(status, code, e.to_string())
}

/// Shared state for the experiment HTTP server.
pub struct AppState<R: ScoreRepository> {
    pub scores: Arc<ScoreService<R>>,
    pub sessions: Arc<SessionService>,
}

/// Experiment HTTP Server.
pub struct ExperimentHttpServer<R: ScoreRepository + 'static> {
    config: HttpConfig,
    scores: Arc<ScoreService<R>>,
    sessions: Arc<SessionService>,
}

impl<R: ScoreRepository + 'static> ExperimentHttpServer<R> {
    pub fn new(
        scores: Arc<ScoreService<R>>,
        sessions: Arc<SessionService>,
        config: HttpConfig,
    ) -> Self {
        Self {
            config,
            scores,
            sessions,
        }
    }

    /// Build the router.
    pub fn build_router(self) -> Router {
        let state = Arc::new(AppState {
            scores: self.scores,
            sessions: self.sessions,
        });

        let app = Router::new()
            .route("/api/pairs", get(list_pairs::<R>))
            .route("/api/next_pair", get(next_pair::<R>))
            .route("/api/sessions", post(create_session::<R>))
            .route("/api/sessions/{id}", get(get_session::<R>))
            .route("/api/sessions/{id}/restart", post(restart_session::<R>))
            .route("/api/submit_decision", post(submit_decision::<R>))
            .route("/api/scores", get(export_scores::<R>))
            .route("/health", get(health_check))
            .with_state(state)
            .nest_service(
                &self.config.images_prefix,
                ServeDir::new(&self.config.images_dir),
            );

        if self.config.enable_cors {
            app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
                .layer(TraceLayer::new_for_http())
        } else {
            app.layer(TraceLayer::new_for_http())
        }
    }

    fn addr(&self) -> Result<SocketAddr, Box<dyn std::error::Error + Send + Sync>> {
        Ok(format!("{}:{}", self.config.host, self.config.port).parse()?)
    }

    /// Start the server.
    pub async fn serve(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = self.addr()?;
        let router = self.build_router();

        tracing::info!(%addr, "experiment HTTP server listening");

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;
        Ok(())
    }

    /// Start the server with a shutdown signal.
    pub async fn serve_with_shutdown<F>(
        self,
        shutdown: F,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = self.addr()?;
        let router = self.build_router();

        tracing::info!(%addr, "experiment HTTP server listening");

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("experiment HTTP server stopped");
        Ok(())
    }
}

// Handler functions

async fn health_check() -> &'static str {
    "OK"
}

async fn list_pairs<R: ScoreRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
) -> Result<Json<PairsResponse>, ApiError> {
    let pools = state.sessions.pools().await.map_err(domain_error)?;
    Ok(Json(PairsResponse {
        count: pools.count(),
        similar_pairs: pools.similar_pairs,
        different_pairs: pools.different_pairs,
    }))
}

async fn next_pair<R: ScoreRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
) -> Result<Json<ImagePair>, ApiError> {
    state
        .sessions
        .next_pair()
        .await
        .map(Json)
        .map_err(domain_error)
}

async fn create_session<R: ScoreRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let target = body.and_then(|Json(req)| req.target);
    let session = state.sessions.create(target).await.map_err(domain_error)?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

async fn get_session<R: ScoreRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.sessions.get(id).await.map_err(domain_error)?;
    Ok(Json(session.into()))
}

async fn restart_session<R: ScoreRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.sessions.restart(id).await.map_err(domain_error)?;
    Ok(Json(session.into()))
}

async fn submit_decision<R: ScoreRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(received) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "unreadable judgment body");
        api_error(StatusCode::BAD_REQUEST, "INVALID_PAYLOAD", "Invalid payload")
    })?;
    let submission: JudgmentSubmission = serde_json::from_value(received.clone())
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, "INVALID_PAYLOAD", e.to_string()))?;

    let judgment =
        Judgment::from_submission(&submission, chrono::Utc::now()).map_err(domain_error)?;

    // Claim the session step first; a stale or unknown id leaves the store untouched.
    let session: Option<SessionResponse> = match submission.session_id {
        Some(id) => Some(
            state
                .sessions
                .advance(id)
                .await
                .map_err(domain_error)?
                .into(),
        ),
        None => None,
    };

    let outcome = state.scores.record_judgment(&judgment).await;
    tracing::info!(pair = %outcome.pair_key, votes = outcome.pair.votes, "judgment accepted");

    let store = state.scores.snapshot().await;
    Ok(Json(SubmitResponse {
        status: "ok",
        received,
        image_scores: store.image_scores,
        pair_scores: store.pair_scores,
        user_scores: store.user_scores,
        session,
    }))
}

async fn export_scores<R: ScoreRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Query(params): Query<ScoresQuery>,
) -> Response {
    let format = ExportFormat::parse(params.format.as_deref());
    match state.scores.export(format).await {
        Export::Json(store) => (
            [(
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"scores.json\"",
            )],
            Json(store),
        )
            .into_response(),
        Export::Csv(csv) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"pair-scores.csv\"",
                ),
            ],
            csv,
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ServerConfig;

    #[test]
    fn test_config_default() {
        let config = HttpConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert!(config.enable_cors);
        assert_eq!(config.images_prefix, "/images");
    }

    #[test]
    fn test_config_from_settings() {
        let server = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: false,
        };
        let config = HttpConfig::from_settings(&server, PathBuf::from("/srv/img"), "/static");
        assert_eq!(config.port, 8080);
        assert!(!config.enable_cors);
        assert_eq!(config.images_dir, PathBuf::from("/srv/img"));
        assert_eq!(config.images_prefix, "/static");
    }

    #[test]
    fn test_domain_error_status_mapping() {
        let cases = [
            (
                DomainError::ValidationFailed("x".into()),
                StatusCode::BAD_REQUEST,
                "INVALID_PAYLOAD",
            ),
            (
                DomainError::NotEnoughImages { found: 1 },
                StatusCode::INTERNAL_SERVER_ERROR,
                "NOT_ENOUGH_IMAGES",
            ),
            (
                DomainError::SessionNotFound(Uuid::nil()),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                DomainError::InvalidStateTransition {
                    from: "finished".into(),
                    to: "in_progress".into(),
                },
                StatusCode::CONFLICT,
                "INVALID_STATE",
            ),
        ];

        for (error, status, code) in cases {
            let (actual, Json(body)) = domain_error(error);
            assert_eq!(actual, status);
            assert_eq!(body.code, code);
        }
    }

    #[test]
    fn test_create_session_request_deserialization() {
        let req: CreateSessionRequest = serde_json::from_str("{}").unwrap();
        assert!(req.target.is_none());
        let req: CreateSessionRequest = serde_json::from_str(r#"{"target": 80}"#).unwrap();
        assert_eq!(req.target, Some(80));
    }

    #[test]
    fn test_session_response_serialization() {
        let session = Session::new(vec![ImagePair::new("a", "b")], 10);
        let json = serde_json::to_value(SessionResponse::from(session)).unwrap();
        assert_eq!(json["length"], 1);
        assert_eq!(json["finished"], false);
        assert_eq!(json["currentPair"]["imgA"], "a");
        assert!(json.get("id").is_some());
    }
}
