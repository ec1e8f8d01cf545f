use serde::{Deserialize, Serialize};

/// Main configuration structure for image-compare
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Score persistence configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Image pool configuration
    #[serde(default)]
    pub images: ImagesConfig,

    /// Session sequencing configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether to enable permissive CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: default_true(),
        }
    }
}

/// Score persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StorageConfig {
    /// Path of the JSON scores document
    #[serde(default = "default_scores_path")]
    pub scores_path: String,
}

fn default_scores_path() -> String {
    "data/scores.json".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            scores_path: default_scores_path(),
        }
    }
}

/// Image pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ImagesConfig {
    /// Directory holding both pool folders; also served statically
    #[serde(default = "default_images_root")]
    pub root: String,

    /// Folder (under `root`) of pre-paired similar images
    #[serde(default = "default_similar_dir")]
    pub similar_dir: String,

    /// Folder (under `root`) of images combined into different pairs
    #[serde(default = "default_different_dir")]
    pub different_dir: String,

    /// URL prefix under which `root` is served
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
}

fn default_images_root() -> String {
    "public/images".to_string()
}

fn default_similar_dir() -> String {
    "Similar_Pictographs".to_string()
}

fn default_different_dir() -> String {
    "Different_Pictographs".to_string()
}

fn default_url_prefix() -> String {
    "/images".to_string()
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            root: default_images_root(),
            similar_dir: default_similar_dir(),
            different_dir: default_different_dir(),
            url_prefix: default_url_prefix(),
        }
    }
}

/// Session sequencing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SessionConfig {
    /// Pairs per session
    #[serde(default = "default_target")]
    pub target: usize,

    /// Whether to inject self-pairs as attention checks
    #[serde(default = "default_true")]
    pub self_pairs: bool,

    /// Fraction of the target reserved for self-pairs
    #[serde(default = "default_self_pair_ratio")]
    pub self_pair_ratio: f64,

    /// Seconds a finished session stays readable before it is dropped
    #[serde(default = "default_finished_ttl_secs")]
    pub finished_ttl_secs: u64,

    /// Seconds without activity after which an unfinished session is dropped
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,
}

/// Largest session length accepted from configuration or a session request.
pub const MAX_SESSION_TARGET: usize = 1000;

const fn default_target() -> usize {
    10
}

const fn default_self_pair_ratio() -> f64 {
    0.1
}

const fn default_finished_ttl_secs() -> u64 {
    3600
}

const fn default_idle_ttl_secs() -> u64 {
    86_400
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            self_pairs: default_true(),
            self_pair_ratio: default_self_pair_ratio(),
            finished_ttl_secs: default_finished_ttl_secs(),
            idle_ttl_secs: default_idle_ttl_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
