//! Configuration management for hnwire.
//!
//! Configuration is read from `~/.config/hnwire/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use crate::fetcher::http_fetcher::DEFAULT_USER_AGENT;
use crate::fetcher::parallel::DEFAULT_WORKERS;
use crate::metadata::MetadataConfig;
use crate::resolver::{DEFAULT_BASE_URL, DEFAULT_MAX_HOPS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub metadata: MetadataConfig,
    pub ancestry: AncestryConfig,
}

/// Forum API access.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Concurrent item requests when loading a listing.
    pub workers: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 10,
            workers: DEFAULT_WORKERS,
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AncestryConfig {
    /// Parent hops allowed before a chain is reported as malformed.
    pub max_hops: usize,
}

impl Default for AncestryConfig {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_config_path()?)
    }

    /// Load configuration from `config_path`.
    ///
    /// If the file doesn't exist, creates a default one with comments.
    /// Missing fields in the file use default values.
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            Self::create_default_config(config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/hnwire/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("hnwire").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# hnwire configuration

[api]
# Root of the forum read API
base_url = "https://hacker-news.firebaseio.com/v0"

user_agent = "hnwire/0.1.0"

# Per-request timeout in seconds
request_timeout_secs = 10

# Concurrent item requests when listing stories
workers = 10

[metadata]
# Page previews that take longer than this (milliseconds) are skipped
timeout_ms = 4000

# Parsed pages kept in memory, least recently used evicted first
parse_cache_capacity = 256

# URLs on this host are placeholders and never fetched
placeholder_host = "localhost"

# Pages larger than this (bytes) are cut off before parsing
max_body_bytes = 2097152

[ancestry]
# Give up on a comment's parent chain after this many hops
max_hops = 500
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
