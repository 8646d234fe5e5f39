//! Inventory types shared by the caches.
//!
//! Resource types partition every cache. Managed objects are handed around as
//! `ManagedObjectRef` handles whose equality is handle identity, while the
//! durable `mo_id` string is what the tag cache keys on.

use ahash::AHashMap as HashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Counter key -> public metric name, for one resource type.
pub type MetricMetadata = HashMap<String, String>;

/// Property name -> value, as last fetched for one managed object.
pub type ObjectProperties = HashMap<String, serde_json::Value>;

/// Ordered `<category>:<tag>` strings attached to one managed object.
pub type ObjectTags = Vec<String>;

/// Category of a vSphere inventory object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    VirtualMachine,
    HostSystem,
    Datacenter,
    Datastore,
    ClusterComputeResource,
}

impl ResourceType {
    pub const ALL: [ResourceType; 5] = [
        ResourceType::VirtualMachine,
        ResourceType::HostSystem,
        ResourceType::Datacenter,
        ResourceType::Datastore,
        ResourceType::ClusterComputeResource,
    ];

    /// vSphere type name, e.g. `vim.HostSystem`.
    pub fn vim_name(&self) -> &'static str {
        match self {
            ResourceType::VirtualMachine => "vim.VirtualMachine",
            ResourceType::HostSystem => "vim.HostSystem",
            ResourceType::Datacenter => "vim.Datacenter",
            ResourceType::Datastore => "vim.Datastore",
            ResourceType::ClusterComputeResource => "vim.ClusterComputeResource",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.vim_name())
    }
}

/// A managed object as returned by the inventory API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedObject {
    pub resource_type: ResourceType,
    pub mo_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ManagedObject {
    pub fn new(resource_type: ResourceType, mo_id: impl Into<String>) -> Self {
        Self {
            resource_type,
            mo_id: mo_id.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Wraps the object in a fresh handle with its own identity.
    pub fn into_ref(self) -> ManagedObjectRef {
        ManagedObjectRef(Arc::new(self))
    }
}

/// Shared handle to one managed object.
///
/// Two handles compare equal only if one was cloned from the other. Handles
/// built separately from identical data are distinct keys, which mirrors how
/// the inventory API hands out a new reference per retrieval.
#[derive(Debug, Clone)]
pub struct ManagedObjectRef(Arc<ManagedObject>);

impl ManagedObjectRef {
    pub fn resource_type(&self) -> ResourceType {
        self.0.resource_type
    }

    /// Durable identifier, stable across retrievals.
    pub fn mo_id(&self) -> &str {
        &self.0.mo_id
    }

    pub fn object(&self) -> &ManagedObject {
        &self.0
    }
}

impl PartialEq for ManagedObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ManagedObjectRef {}

impl Hash for ManagedObjectRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl From<ManagedObject> for ManagedObjectRef {
    fn from(object: ManagedObject) -> Self {
        object.into_ref()
    }
}
