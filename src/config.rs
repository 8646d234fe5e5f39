//! Configuration management for the vSphere snapshot caches.
//!
//! This module handles loading and validating cache refresh intervals from
//! files. It supports YAML, JSON, and TOML formats.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// Default configuration constants
pub const DEFAULT_METRICS_METADATA_INTERVAL: u64 = 1800;
pub const DEFAULT_INFRASTRUCTURE_INTERVAL: u64 = 300;
pub const DEFAULT_TAGS_INTERVAL: u64 = 300;

/// Longest accepted refresh interval. Anything above is most likely a
/// milliseconds value in a seconds field.
pub const MAX_INTERVAL_SECONDS: u64 = 7 * 24 * 3600;

const DEFAULT_CONFIG_PATHS: [&str; 6] = [
    "/etc/vsphere-snapshot-cache/config.yaml",
    "/etc/vsphere-snapshot-cache/config.yml",
    "/etc/vsphere-snapshot-cache/config.json",
    "./vsphere-snapshot-cache.yaml",
    "./vsphere-snapshot-cache.yml",
    "./vsphere-snapshot-cache.json",
];

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid TOML configuration: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("failed to render TOML configuration: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("{field} = {value} exceeds the maximum of {} seconds", MAX_INTERVAL_SECONDS)]
    IntervalTooLarge { field: &'static str, value: u64 },
}

/// Cache refresh settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds between metric metadata refreshes (default: 1800)
    #[serde(
        default = "default_metrics_metadata_interval",
        alias = "refresh-metrics-metadata-cache-interval"
    )]
    pub refresh_metrics_metadata_cache_interval: u64,

    /// Seconds between inventory refreshes (default: 300)
    #[serde(
        default = "default_infrastructure_interval",
        alias = "refresh-infrastructure-cache-interval"
    )]
    pub refresh_infrastructure_cache_interval: u64,

    /// Seconds between tag refreshes (default: 300)
    #[serde(default = "default_tags_interval", alias = "refresh-tags-cache-interval")]
    pub refresh_tags_cache_interval: u64,

    /// Whether the tag cache is refreshed at all
    #[serde(default, alias = "collect-tags")]
    pub collect_tags: bool,

    #[serde(default = "default_log_level", alias = "log-level")]
    pub log_level: String,
}

fn default_metrics_metadata_interval() -> u64 {
    DEFAULT_METRICS_METADATA_INTERVAL
}
fn default_infrastructure_interval() -> u64 {
    DEFAULT_INFRASTRUCTURE_INTERVAL
}
fn default_tags_interval() -> u64 {
    DEFAULT_TAGS_INTERVAL
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_metrics_metadata_cache_interval: default_metrics_metadata_interval(),
            refresh_infrastructure_cache_interval: default_infrastructure_interval(),
            refresh_tags_cache_interval: default_tags_interval(),
            collect_tags: false,
            log_level: default_log_level(),
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_config(cfg: &CacheConfig) -> Result<(), ConfigError> {
    let intervals = [
        (
            "refresh_metrics_metadata_cache_interval",
            cfg.refresh_metrics_metadata_cache_interval,
        ),
        (
            "refresh_infrastructure_cache_interval",
            cfg.refresh_infrastructure_cache_interval,
        ),
        ("refresh_tags_cache_interval", cfg.refresh_tags_cache_interval),
    ];

    for (field, value) in intervals {
        if value > MAX_INTERVAL_SECONDS {
            return Err(ConfigError::IntervalTooLarge { field, value });
        }
        if value == 0 {
            warn!("{} is 0, the cache will refresh on every check", field);
        }
    }

    Ok(())
}

/// Loads configuration from `path`, or from the first default location that
/// exists. Falls back to defaults when no file is found.
pub fn load_config(path: Option<&Path>) -> Result<CacheConfig, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match DEFAULT_CONFIG_PATHS.iter().find(|p| Path::new(p).exists()) {
            Some(p) => PathBuf::from(p),
            None => return Ok(CacheConfig::default()),
        },
    };

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;

    let config = parse_config(&content, &path)?;
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Parses `content` according to the extension of `path` (YAML by default).
pub fn parse_config(content: &str, path: &Path) -> Result<CacheConfig, ConfigError> {
    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(content)?,
        Some("toml") => toml::from_str(content)?,
        _ => serde_yaml::from_str(content)?,
    };
    Ok(config)
}

/// Renders configuration in the requested format.
pub fn render_config(config: &CacheConfig, format: ConfigFormat) -> Result<String, ConfigError> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}
