//! Metric metadata cache.
//!
//! Holds, per resource type, the mapping from vSphere performance counter keys
//! to the metric names we publish:
//!
//! ```text
//! HostSystem     -> { "6" -> "cpu.usage.avg", ... }
//! VirtualMachine -> { ... }
//! ```

use crate::cache::{CacheUpdate, SnapshotCache};
use crate::clock::{Clock, SystemClock};
use crate::types::{MetricMetadata, ResourceType};

pub const CACHE_NAME: &str = "metrics_metadata";

pub type MetricsMetadataCache<C = SystemClock> = SnapshotCache<ResourceType, MetricMetadata, C>;

impl<C: Clock> SnapshotCache<ResourceType, MetricMetadata, C> {
    /// Metadata for `resource_type`, or `None` if it was never fetched.
    ///
    /// A type that was fetched but has no counters yields an empty map.
    pub fn get_metadata(&self, resource_type: ResourceType) -> Option<&MetricMetadata> {
        self.get(&resource_type)
    }
}

impl<C: Clock> CacheUpdate<'_, ResourceType, MetricMetadata, C> {
    /// Replaces the staged metadata for `resource_type`.
    pub fn set_metadata(&mut self, resource_type: ResourceType, metadata: MetricMetadata) {
        self.insert(resource_type, metadata);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn metadata(pairs: &[(&str, &str)]) -> MetricMetadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_absent_and_empty_are_distinct() {
        let mut cache = MetricsMetadataCache::<ManualClock>::with_clock(1800, ManualClock::at_epoch());

        cache
            .update(|u| {
                u.set_metadata(ResourceType::Datastore, MetricMetadata::default());
                Ok::<_, String>(())
            })
            .unwrap();

        assert!(cache.get_metadata(ResourceType::HostSystem).is_none());
        assert_eq!(
            cache.get_metadata(ResourceType::Datastore),
            Some(&MetricMetadata::default())
        );
    }

    #[test]
    fn test_set_metadata_replaces_entry() {
        let mut cache = MetricsMetadataCache::<ManualClock>::with_clock(1800, ManualClock::at_epoch());

        cache
            .update(|u| {
                u.set_metadata(ResourceType::HostSystem, metadata(&[("1", "cpu.usage.avg")]));
                u.set_metadata(ResourceType::HostSystem, metadata(&[("2", "mem.usage.avg")]));
                Ok::<_, String>(())
            })
            .unwrap();

        let host = cache.get_metadata(ResourceType::HostSystem).unwrap();
        assert_eq!(host, &metadata(&[("2", "mem.usage.avg")]));
    }
}
