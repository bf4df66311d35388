//! Configuration loading for appraised.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.appraise/config.toml` (user)
//! 3. `/etc/appraise/config.toml` (system)

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::model::ModelSource;
use crate::{AppraiseError, Result};

/// Daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub cache: PredictionCacheConfig,
}

/// Server network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:9750).
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            limits: LimitsConfig::default(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:9750".to_string()
}

/// Resource limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum concurrent requests per connection (default: 100).
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent(),
            request_timeout_secs: default_timeout(),
        }
    }
}

fn default_max_concurrent() -> usize {
    100
}

fn default_timeout() -> u64 {
    30
}

/// Which model artifact to serve.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelConfig {
    /// Local artifact path.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Remote artifact URL, downloaded once into `cache_dir`.
    #[serde(default)]
    pub url: Option<String>,
    /// Download directory for remote artifacts.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl ModelConfig {
    /// The configured source. Exactly one of `path` and `url` must be set.
    pub fn source(&self) -> Result<ModelSource> {
        match (&self.path, &self.url) {
            (Some(path), None) => Ok(ModelSource::local(path)),
            (None, Some(url)) => Ok(ModelSource::remote(url)),
            (Some(_), Some(_)) => Err(AppraiseError::Configuration(
                "[model] sets both path and url".to_string(),
            )),
            (None, None) => Err(AppraiseError::Configuration(
                "no model configured: set [model] path or url, or pass --model".to_string(),
            )),
        }
    }
}

/// Prediction cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionCacheConfig {
    /// Cache results for repeated records (default: false).
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
}

impl Default for PredictionCacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_entries: default_max_entries(),
            ttl_secs: default_ttl(),
        }
    }
}

fn default_max_entries() -> u64 {
    10_000
}

fn default_ttl() -> u64 {
    3600
}

impl PredictionCacheConfig {
    /// The cache configuration, or `None` when caching is disabled.
    pub fn to_cache_config(&self) -> Option<CacheConfig> {
        self.enabled.then(|| {
            CacheConfig::new()
                .max_entries(self.max_entries)
                .ttl(Duration::from_secs(self.ttl_secs))
        })
    }
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `~/.appraise/config.toml`
    /// 3. `/etc/appraise/config.toml`
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit_path)?;
        Self::load_from_file(&path)
    }

    /// Like [`Config::load`], but falls back to defaults when no config file
    /// exists in the standard locations. An explicit path must still exist.
    pub fn load_or_default(explicit_path: Option<&Path>) -> Result<Self> {
        if explicit_path.is_some() {
            return Self::load(explicit_path);
        }
        match Self::find_standard_path() {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppraiseError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            AppraiseError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(AppraiseError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        Self::find_standard_path().ok_or_else(|| {
            AppraiseError::Configuration(
                "No config file found. Create ~/.appraise/config.toml or /etc/appraise/config.toml"
                    .to_string(),
            )
        })
    }

    fn find_standard_path() -> Option<PathBuf> {
        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".appraise").join("config.toml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/appraise/config.toml");
        system_config.exists().then_some(system_config)
    }
}
