//! Refresh driver for the snapshot caches.
//!
//! This module provides the check-cycle entry point: refresh a cache only when
//! it has expired, record the outcome in telemetry, and hand population errors
//! back to the caller after the cache has rolled back.

use std::hash::Hash;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

use crate::cache::{CacheUpdate, SnapshotCache};
use crate::caches::{infrastructure, metadata, tags};
use crate::caches::{InfrastructureCache, MetricsMetadataCache, TagsCache};
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::telemetry::CacheTelemetry;

/// What a call to [`refresh_if_expired`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The cache was still fresh and was left untouched.
    Fresh,
    /// The cache was expired and a new snapshot was committed.
    Refreshed { entries: usize, duration: Duration },
}

/// Repopulates `cache` through `populate` if it has expired.
///
/// A failing `populate` leaves the previous snapshot in place, bumps the
/// failure counter, and returns its error.
#[instrument(skip_all, fields(cache = cache.name()))]
pub fn refresh_if_expired<K, V, C, F, E>(
    cache: &mut SnapshotCache<K, V, C>,
    telemetry: Option<&CacheTelemetry>,
    populate: F,
) -> Result<RefreshOutcome, E>
where
    K: Eq + Hash,
    C: Clock,
    F: FnOnce(&mut CacheUpdate<'_, K, V, C>) -> Result<(), E>,
{
    if !cache.is_expired() {
        debug!("Cache still fresh, skipping refresh");
        return Ok(RefreshOutcome::Fresh);
    }

    info!("Starting cache refresh");
    let start = Instant::now();
    let result = cache.update(populate);

    if let Some(telemetry) = telemetry {
        telemetry.observe(cache);
        if result.is_err() {
            telemetry.record_failure(cache.name());
        }
    }
    result?;

    let duration = start.elapsed();
    info!(
        "Cache refresh completed: {} resource types, {:.2}ms",
        cache.len(),
        duration.as_secs_f64() * 1000.0
    );

    Ok(RefreshOutcome::Refreshed {
        entries: cache.len(),
        duration,
    })
}

/// The caches one vSphere check instance owns.
pub struct CacheSet<C = SystemClock> {
    pub metrics_metadata: MetricsMetadataCache<C>,
    pub infrastructure: InfrastructureCache<C>,
    /// Present only when tag collection is enabled.
    pub tags: Option<TagsCache<C>>,
}

impl CacheSet<SystemClock> {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock + Clone> CacheSet<C> {
    pub fn with_clock(config: &CacheConfig, clock: C) -> Self {
        let tags = config.collect_tags.then(|| {
            TagsCache::<C>::with_clock(config.refresh_tags_cache_interval, clock.clone())
                .named(tags::CACHE_NAME)
        });

        Self {
            metrics_metadata: MetricsMetadataCache::<C>::with_clock(
                config.refresh_metrics_metadata_cache_interval,
                clock.clone(),
            )
            .named(metadata::CACHE_NAME),
            infrastructure: InfrastructureCache::<C>::with_clock(
                config.refresh_infrastructure_cache_interval,
                clock,
            )
            .named(infrastructure::CACHE_NAME),
            tags,
        }
    }

    /// Pushes the status of every cache into `telemetry`.
    pub fn observe(&self, telemetry: &CacheTelemetry) {
        telemetry.observe(&self.metrics_metadata);
        telemetry.observe(&self.infrastructure);
        if let Some(tags) = &self.tags {
            telemetry.observe(tags);
        }
    }
}
