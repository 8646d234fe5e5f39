//! CLI arguments and subcommands for vsphere-snapshot-cache.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use vsphere_snapshot_cache::config::{CacheConfig, ConfigFormat};

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "vsphere-snapshot-cache",
    about = "Inspect and validate vSphere snapshot cache settings",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (overrides log_level from the config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Override the metric metadata refresh interval (seconds)
    #[arg(long)]
    pub metadata_interval: Option<u64>,

    /// Override the inventory refresh interval (seconds)
    #[arg(long)]
    pub infrastructure_interval: Option<u64>,

    /// Override the tag refresh interval (seconds)
    #[arg(long)]
    pub tags_interval: Option<u64>,

    /// Enable the tag cache
    #[arg(long)]
    pub collect_tags: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Populate every cache from a fixture file and print a summary
    Inspect {
        /// Fixture file (YAML/JSON)
        #[arg(short = 'f', long)]
        fixture: PathBuf,

        /// Also print cache telemetry in Prometheus text format
        #[arg(long)]
        metrics: bool,
    },
}

impl Args {
    /// Applies CLI overrides on top of file configuration. CLI wins if provided.
    pub fn apply_overrides(&self, config: &mut CacheConfig) {
        if let Some(secs) = self.metadata_interval {
            config.refresh_metrics_metadata_cache_interval = secs;
        }
        if let Some(secs) = self.infrastructure_interval {
            config.refresh_infrastructure_cache_interval = secs;
        }
        if let Some(secs) = self.tags_interval {
            config.refresh_tags_cache_interval = secs;
        }
        if self.collect_tags {
            config.collect_tags = true;
        }
    }
}
