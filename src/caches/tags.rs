//! Tag cache.
//!
//! Tags are keyed by the object's durable `mo_id` rather than by handle, since
//! the same object comes back as a different handle on every retrieval.

use ahash::AHashMap as HashMap;

use crate::cache::{CacheUpdate, SnapshotCache};
use crate::clock::{Clock, SystemClock};
use crate::types::{ManagedObjectRef, ObjectTags, ResourceType};

pub const CACHE_NAME: &str = "tags";

/// `mo_id` -> tags, for one resource type.
pub type TagIndex = HashMap<String, ObjectTags>;

/// Full tag content, as fetched in one pass.
pub type TagsByType = HashMap<ResourceType, TagIndex>;

pub type TagsCache<C = SystemClock> = SnapshotCache<ResourceType, TagIndex, C>;

impl<C: Clock> SnapshotCache<ResourceType, TagIndex, C> {
    /// Tags of `object`, empty when none are known.
    pub fn get_object_tags(&self, object: &ManagedObjectRef) -> &[String] {
        self.get(&object.resource_type())
            .and_then(|tags| tags.get(object.mo_id()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl<C: Clock> CacheUpdate<'_, ResourceType, TagIndex, C> {
    /// Stages `tags` as the complete tag content.
    pub fn set_all_tags(&mut self, tags: TagsByType) {
        self.replace_all(tags);
    }
}
