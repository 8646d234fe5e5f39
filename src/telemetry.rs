//! Prometheus telemetry for cache refreshes.
//!
//! Every series carries a `cache` label with the cache name.

use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::hash::Hash;

use crate::cache::SnapshotCache;
use crate::clock::Clock;

/// Gauges and counters describing cache state.
#[derive(Clone)]
pub struct CacheTelemetry {
    pub entries: GaugeVec,
    pub last_update_timestamp_seconds: GaugeVec,
    pub update_duration_seconds: GaugeVec,
    pub update_success: GaugeVec,
    pub update_failures_total: CounterVec,
}

impl CacheTelemetry {
    /// Creates and registers all cache metrics with the registry.
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let entries = GaugeVec::new(
            Opts::new(
                "vsphere_cache_entries",
                "Resource types held in the live cache snapshot",
            ),
            &["cache"],
        )?;
        let last_update_timestamp_seconds = GaugeVec::new(
            Opts::new(
                "vsphere_cache_last_update_timestamp_seconds",
                "Unix time of the last committed cache update",
            ),
            &["cache"],
        )?;
        let update_duration_seconds = GaugeVec::new(
            Opts::new(
                "vsphere_cache_update_duration_seconds",
                "Duration of the last cache update attempt in seconds",
            ),
            &["cache"],
        )?;
        let update_success = GaugeVec::new(
            Opts::new(
                "vsphere_cache_update_success",
                "Whether the last cache update committed (1) or rolled back (0)",
            ),
            &["cache"],
        )?;
        let update_failures_total = CounterVec::new(
            Opts::new(
                "vsphere_cache_update_failures_total",
                "Total cache updates rolled back",
            ),
            &["cache"],
        )?;

        registry.register(Box::new(entries.clone()))?;
        registry.register(Box::new(last_update_timestamp_seconds.clone()))?;
        registry.register(Box::new(update_duration_seconds.clone()))?;
        registry.register(Box::new(update_success.clone()))?;
        registry.register(Box::new(update_failures_total.clone()))?;

        Ok(Self {
            entries,
            last_update_timestamp_seconds,
            update_duration_seconds,
            update_success,
            update_failures_total,
        })
    }

    /// Copies the cache's current status into the gauges.
    pub fn observe<K, V, C>(&self, cache: &SnapshotCache<K, V, C>)
    where
        K: Eq + Hash,
        C: Clock,
    {
        let name = cache.name();
        let status = cache.status();

        self.entries
            .with_label_values(&[name])
            .set(status.entries as f64);

        if let Some(ts) = status.last_updated {
            self.last_update_timestamp_seconds
                .with_label_values(&[name])
                .set(ts.timestamp_millis() as f64 / 1000.0);
        }
        if let Some(duration) = status.last_update_duration {
            self.update_duration_seconds
                .with_label_values(&[name])
                .set(duration.as_secs_f64());
        }
        if let Some(succeeded) = status.last_attempt_succeeded {
            self.update_success
                .with_label_values(&[name])
                .set(if succeeded { 1.0 } else { 0.0 });
        }
    }

    pub fn record_failure(&self, cache: &str) {
        self.update_failures_total.with_label_values(&[cache]).inc();
    }
}

/// Renders every metric in `registry` in the text exposition format.
pub fn encode_text(registry: &Registry) -> prometheus::Result<String> {
    let families = registry.gather();
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
