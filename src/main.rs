//! vsphere-snapshot-cache - version 0.1.0
//!
//! Command-line front end for the snapshot caches with tracing logging.
//! Validates and prints cache configuration, and can populate every cache from
//! a fixture file to inspect what a check would see.

mod cli;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use prometheus::Registry;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};

use cli::{Args, Commands, LogLevel};
use vsphere_snapshot_cache::config::{load_config, render_config, validate_config};
use vsphere_snapshot_cache::fixture::load_fixture;
use vsphere_snapshot_cache::telemetry::encode_text;
use vsphere_snapshot_cache::{
    refresh_if_expired, CacheConfig, CacheSet, CacheTelemetry, RefreshOutcome, ResourceType,
};

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(config: &CacheConfig, args: &Args) {
    let level = args.log_level.clone().unwrap_or_else(|| {
        LogLevel::from_str(&config.log_level, true).unwrap_or(LogLevel::Info)
    });

    let filter = match level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Logging initialized with level: {:?}", level);
}

fn report(name: &str, outcome: RefreshOutcome) {
    match outcome {
        RefreshOutcome::Fresh => println!("{name}: fresh, not refreshed"),
        RefreshOutcome::Refreshed { entries, duration } => println!(
            "{name}: refreshed {entries} resource types in {:.2}ms",
            duration.as_secs_f64() * 1000.0
        ),
    }
}

/// Populates every cache from `path` and prints what ended up cached.
fn command_inspect(config: &CacheConfig, path: &Path, print_metrics: bool) -> anyhow::Result<()> {
    let fixture = load_fixture(path)
        .with_context(|| format!("failed to load fixture {}", path.display()))?;

    let registry = Registry::new();
    let telemetry = CacheTelemetry::new(&registry)?;
    let mut caches = CacheSet::from_config(config);

    let outcome = refresh_if_expired(&mut caches.metrics_metadata, Some(&telemetry), |u| {
        fixture.populate_metadata(u)
    })?;
    report(caches.metrics_metadata.name(), outcome);

    let outcome = refresh_if_expired(&mut caches.infrastructure, Some(&telemetry), |u| {
        fixture.populate_infrastructure(u).map(|_| ())
    })?;
    report(caches.infrastructure.name(), outcome);

    match caches.tags.as_mut() {
        Some(tags) => {
            let outcome =
                refresh_if_expired(tags, Some(&telemetry), |u| fixture.populate_tags(u))?;
            report(tags.name(), outcome);
        }
        None if !fixture.tags.is_empty() => {
            warn!("Fixture contains tags but tag collection is disabled");
        }
        None => {}
    }

    println!();
    for resource_type in ResourceType::ALL {
        let mut objects: Vec<_> = caches
            .infrastructure
            .get_objects_of_type(resource_type)
            .collect();
        let counters = caches
            .metrics_metadata
            .get_metadata(resource_type)
            .map(|m| m.len());

        if objects.is_empty() && counters.is_none() {
            continue;
        }

        println!(
            "{}: {} objects, {} counters",
            resource_type,
            objects.len(),
            counters.map_or_else(|| "-".to_string(), |n| n.to_string())
        );

        objects.sort_by(|a, b| a.mo_id().cmp(b.mo_id()));
        for object in objects {
            let tags = caches
                .tags
                .as_ref()
                .map(|t| t.get_object_tags(object))
                .unwrap_or(&[]);
            println!(
                "  {} ({}) tags=[{}]",
                object.mo_id(),
                object.object().name.as_deref().unwrap_or("-"),
                tags.join(", ")
            );
        }
    }

    if print_metrics {
        caches.observe(&telemetry);
        println!();
        print!("{}", encode_text(&registry)?);
    }

    Ok(())
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = if args.no_config {
        CacheConfig::default()
    } else {
        load_config(args.config.as_deref())?
    };
    args.apply_overrides(&mut config);

    setup_logging(&config, &args);

    if args.check_config {
        if let Err(e) = validate_config(&config) {
            eprintln!("❌ Configuration invalid: {}", e);
            std::process::exit(1);
        }
        println!("✅ Configuration is valid");
        return Ok(());
    }

    if args.show_config {
        println!("{}", render_config(&config, args.config_format)?);
        return Ok(());
    }

    validate_config(&config)?;

    match &args.command {
        Some(Commands::Inspect { fixture, metrics }) => command_inspect(&config, fixture, *metrics),
        None => {
            println!(
                "metrics_metadata: every {}s\ninfrastructure: every {}s\ntags: {}",
                config.refresh_metrics_metadata_cache_interval,
                config.refresh_infrastructure_cache_interval,
                if config.collect_tags {
                    format!("every {}s", config.refresh_tags_cache_interval)
                } else {
                    "disabled".to_string()
                }
            );
            Ok(())
        }
    }
}
