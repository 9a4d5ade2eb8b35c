//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::storage::StorageConfig;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Upload behaviour.
    #[serde(default)]
    pub media: MediaConfig,
    /// Likes and comments.
    #[serde(default)]
    pub engagement: EngagementConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Upload configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Maximum number of object-store uploads in flight for one request.
    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,
    /// Maximum number of files accepted by one create or append call.
    #[serde(default = "default_max_files_per_upload")]
    pub max_files_per_upload: usize,
    /// Maximum request body size for uploads, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            upload_concurrency: default_upload_concurrency(),
            max_files_per_upload: default_max_files_per_upload(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Engagement configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngagementConfig {
    /// Where a client keeps its voter token between sessions.
    #[serde(default = "default_voter_token_path")]
    pub voter_token_path: PathBuf,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            voter_token_path: default_voter_token_path(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_upload_concurrency() -> usize {
    4
}

const fn default_max_files_per_upload() -> usize {
    64
}

const fn default_max_upload_bytes() -> usize {
    256 * 1024 * 1024
}

fn default_voter_token_path() -> PathBuf {
    PathBuf::from("./data/voter-token")
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `MEMENTO_ENV`)
    /// 3. Environment variables with `MEMENTO_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("MEMENTO_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("MEMENTO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("MEMENTO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
