//! Implementation of the `image-compare serve` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use crate::adapters::http::{ExperimentHttpServer, HttpConfig};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::images::DirectoryImagePool;
use crate::infrastructure::logging::{LogConfig, LoggerImpl};
use crate::infrastructure::storage::JsonFileScoreRepository;
use crate::services::{PairSelector, ScoreService, SessionRetention, SessionService};

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Host to bind to (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Scores document (overrides storage.scores_path)
    #[arg(long)]
    pub scores_path: Option<PathBuf>,

    /// Image root directory (overrides images.root)
    #[arg(long)]
    pub images_root: Option<PathBuf>,
}

impl ServeArgs {
    fn apply(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(path) = self.scores_path {
            config.storage.scores_path = path.display().to_string();
        }
        if let Some(root) = self.images_root {
            config.images.root = root.display().to_string();
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ServeOutput {
    pub address: String,
    pub scores_path: String,
    pub images_root: String,
    pub session_target: usize,
    pub self_pairs: bool,
}

impl CommandOutput for ServeOutput {
    fn to_human(&self) -> String {
        format!(
            "Serving on http://{}\n  scores: {}\n  images: {}\n  session target: {} (self-pairs {})",
            self.address,
            self.scores_path,
            self.images_root,
            self.session_target,
            if self.self_pairs { "on" } else { "off" }
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ServeArgs, mut config: Config, json_mode: bool) -> Result<()> {
    args.apply(&mut config);
    ConfigLoader::validate(&config).context("Invalid server configuration")?;

    let _logger = LoggerImpl::init(&LogConfig::from_settings(&config.logging))
        .context("Failed to initialize logging")?;

    let repository = Arc::new(JsonFileScoreRepository::new(&config.storage.scores_path));
    let scores = Arc::new(ScoreService::load(repository).await);

    let pool = Arc::new(DirectoryImagePool::from_config(&config.images));
    let sessions = Arc::new(
        SessionService::new(pool, PairSelector::from(&config.session))
            .with_retention(SessionRetention::from(&config.session)),
    );

    let http_config = HttpConfig::from_settings(
        &config.server,
        PathBuf::from(&config.images.root),
        &config.images.url_prefix,
    );

    output(
        &ServeOutput {
            address: format!("{}:{}", http_config.host, http_config.port),
            scores_path: config.storage.scores_path.clone(),
            images_root: config.images.root.clone(),
            session_target: config.session.target,
            self_pairs: config.session.self_pairs,
        },
        json_mode,
    );

    ExperimentHttpServer::new(scores, sessions, http_config)
        .serve_with_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_config() {
        let mut config = Config::default();
        ServeArgs {
            host: Some("0.0.0.0".to_string()),
            port: Some(8080),
            scores_path: Some(PathBuf::from("/tmp/scores.json")),
            images_root: None,
        }
        .apply(&mut config);

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.scores_path, "/tmp/scores.json");
        assert_eq!(config.images.root, "public/images");
    }

    #[test]
    fn test_empty_args_keep_config() {
        let mut config = Config::default();
        ServeArgs::default().apply(&mut config);
        assert_eq!(config.server.port, 3000);
    }
}
