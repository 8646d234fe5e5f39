//! Typed caches built on `SnapshotCache`.
//!
//! Each cache is partitioned by `ResourceType` and adds a few accessors that
//! shape keys for one kind of vSphere data: metric metadata, inventory object
//! properties, and tags.

pub mod infrastructure;
pub mod metadata;
pub mod tags;

pub use infrastructure::{InfrastructureCache, ObjectIndex};
pub use metadata::MetricsMetadataCache;
pub use tags::{TagIndex, TagsCache, TagsByType};
