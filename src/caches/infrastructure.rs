//! Inventory object cache.
//!
//! Properties of every inventory object from the last sync, partitioned by
//! resource type and keyed by the object handle itself. Objects deleted since
//! the last sync simply stop resolving.

use ahash::AHashMap as HashMap;

use crate::cache::{CacheUpdate, SnapshotCache};
use crate::clock::{Clock, SystemClock};
use crate::types::{ManagedObjectRef, ObjectProperties, ResourceType};

pub const CACHE_NAME: &str = "infrastructure";

/// Object handle -> properties, for one resource type.
pub type ObjectIndex = HashMap<ManagedObjectRef, ObjectProperties>;

pub type InfrastructureCache<C = SystemClock> = SnapshotCache<ResourceType, ObjectIndex, C>;

impl<C: Clock> SnapshotCache<ResourceType, ObjectIndex, C> {
    /// Cached properties of `object`, falling back to `default` when its type
    /// or the object itself is unknown.
    pub fn get_object_properties<'a>(
        &'a self,
        object: &ManagedObjectRef,
        default: Option<&'a ObjectProperties>,
    ) -> Option<&'a ObjectProperties> {
        self.get(&object.resource_type())
            .and_then(|objects| objects.get(object))
            .or(default)
    }

    /// All cached objects of `resource_type`. Empty if the type was never
    /// populated.
    pub fn get_objects_of_type(
        &self,
        resource_type: ResourceType,
    ) -> impl Iterator<Item = &ManagedObjectRef> + '_ {
        self.get(&resource_type)
            .into_iter()
            .flat_map(|objects| objects.keys())
    }
}

impl<C: Clock> CacheUpdate<'_, ResourceType, ObjectIndex, C> {
    /// Stages `properties` for `object`, overwriting any earlier value.
    pub fn set_object_properties(&mut self, object: ManagedObjectRef, properties: ObjectProperties) {
        self.get_or_insert_with(object.resource_type(), ObjectIndex::default)
            .insert(object, properties);
    }
}
