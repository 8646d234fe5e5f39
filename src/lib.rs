//! vSphere Snapshot Cache Library
//!
//! This library provides the caches a vSphere monitoring check keeps between
//! collection cycles, so metric metadata, inventory properties and tags are
//! not re-fetched from vCenter on every run.
//!
//! # Features
//!
//! - **Whole-cache TTL**: every cache expires as a unit after a fixed interval
//! - **All-or-nothing updates**: a failed refresh keeps the previous snapshot
//! - **Typed accessors**: metadata by resource type, properties by object handle,
//!   tags by durable object id
//! - **Telemetry**: Prometheus gauges for cache size, age and refresh outcome
//!
//! # Usage
//!
//! ```rust
//! use vsphere_snapshot_cache::{
//!     refresh_if_expired, InfrastructureCache, ManagedObject, ObjectProperties,
//!     RefreshOutcome, ResourceType,
//! };
//!
//! let mut cache = InfrastructureCache::new(300);
//! let vm = ManagedObject::new(ResourceType::VirtualMachine, "vm-42").into_ref();
//!
//! let outcome = refresh_if_expired(&mut cache, None, |update| {
//!     update.set_object_properties(vm.clone(), ObjectProperties::default());
//!     Ok::<_, std::io::Error>(())
//! })
//! .unwrap();
//!
//! assert!(matches!(outcome, RefreshOutcome::Refreshed { .. }));
//! assert!(cache.get_object_properties(&vm, None).is_some());
//! ```

pub mod cache;
pub mod caches;
pub mod clock;
pub mod config;
pub mod fixture;
pub mod refresh;
pub mod telemetry;
pub mod types;

// Re-export main types for convenience
pub use cache::{CacheStatus, CacheUpdate, SnapshotCache};
pub use caches::{InfrastructureCache, MetricsMetadataCache, ObjectIndex, TagIndex, TagsByType, TagsCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, ConfigError};
pub use fixture::{FixtureError, InventoryFixture};
pub use refresh::{refresh_if_expired, CacheSet, RefreshOutcome};
pub use telemetry::CacheTelemetry;
pub use types::{
    ManagedObject, ManagedObjectRef, MetricMetadata, ObjectProperties, ObjectTags, ResourceType,
};
