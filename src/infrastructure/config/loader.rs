use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

pub use crate::domain::models::config::MAX_SESSION_TARGET;
use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port: {0}. Must be non-zero")]
    InvalidPort(u16),

    #[error("Scores path cannot be empty")]
    EmptyScoresPath,

    #[error("Image folder setting '{0}' cannot be empty")]
    EmptyImageDir(&'static str),

    #[error("Invalid image URL prefix: '{0}'. Must start with '/' and name a path segment")]
    InvalidUrlPrefix(String),

    #[error("Invalid session target: {0}. Must be between 1 and {MAX_SESSION_TARGET}")]
    InvalidSessionTarget(usize),

    #[error("Invalid self-pair ratio: {0}. Must be greater than 0 and at most 1")]
    InvalidSelfPairRatio(f64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .image-compare/config.yaml (project config)
    /// 3. .image-compare/local.yaml (project local overrides, optional)
    /// 4. Environment variables (IMAGE_COMPARE_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".image-compare/config.yaml"))
            .merge(Yaml::file(".image-compare/local.yaml"))
            .merge(Env::prefixed("IMAGE_COMPARE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring env overrides
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("IMAGE_COMPARE_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.server.port == 0 {
            return Err(ConfigError::InvalidPort(config.server.port));
        }

        if config.storage.scores_path.trim().is_empty() {
            return Err(ConfigError::EmptyScoresPath);
        }

        if config.images.root.trim().is_empty() {
            return Err(ConfigError::EmptyImageDir("root"));
        }
        if config.images.similar_dir.trim().is_empty() {
            return Err(ConfigError::EmptyImageDir("similar_dir"));
        }
        if config.images.different_dir.trim().is_empty() {
            return Err(ConfigError::EmptyImageDir("different_dir"));
        }

        let prefix = &config.images.url_prefix;
        if !prefix.starts_with('/') || prefix.trim_matches('/').is_empty() {
            return Err(ConfigError::InvalidUrlPrefix(prefix.clone()));
        }

        if config.session.target == 0 || config.session.target > MAX_SESSION_TARGET {
            return Err(ConfigError::InvalidSessionTarget(config.session.target));
        }

        let ratio = config.session.self_pair_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(ConfigError::InvalidSelfPairRatio(ratio));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        Ok(())
    }
}
