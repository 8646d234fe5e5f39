//! File-backed inventory source.
//!
//! An `InventoryFixture` stands in for a live vCenter: it carries metric
//! metadata, inventory objects with their properties, and tags, and can
//! populate each cache's update scope from that data. Fixtures are JSON or
//! YAML, for example:
//!
//! ```yaml
//! metadata:
//!   host_system:
//!     "2": cpu.usage.avg
//! objects:
//!   - resource_type: virtual_machine
//!     mo_id: vm-1
//!     name: db-01
//!     properties:
//!       runtime.powerState: poweredOn
//! tags:
//!   virtual_machine:
//!     vm-1: ["env:prod"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cache::CacheUpdate;
use crate::caches::{ObjectIndex, TagIndex, TagsByType};
use crate::clock::Clock;
use crate::types::{ManagedObject, MetricMetadata, ObjectProperties, ResourceType};

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to read fixture {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid YAML fixture: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON fixture: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate {resource_type} object '{mo_id}' in fixture")]
    DuplicateObject {
        resource_type: ResourceType,
        mo_id: String,
    },
}

/// One inventory object with its properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureObject {
    #[serde(flatten)]
    pub object: ManagedObject,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

/// Static snapshot of a vSphere environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryFixture {
    #[serde(default)]
    pub metadata: BTreeMap<ResourceType, BTreeMap<String, String>>,
    #[serde(default)]
    pub objects: Vec<FixtureObject>,
    #[serde(default)]
    pub tags: BTreeMap<ResourceType, BTreeMap<String, Vec<String>>>,
}

/// Loads a fixture, parsing JSON for `.json` files and YAML otherwise.
pub fn load_fixture(path: &Path) -> Result<InventoryFixture, FixtureError> {
    let content = fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let fixture: InventoryFixture = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };

    info!(
        "Loaded fixture from {}: {} objects",
        path.display(),
        fixture.objects.len()
    );
    Ok(fixture)
}

impl InventoryFixture {
    /// Stages metric metadata for every resource type in the fixture.
    pub fn populate_metadata<C: Clock>(
        &self,
        update: &mut CacheUpdate<'_, ResourceType, MetricMetadata, C>,
    ) -> Result<(), FixtureError> {
        for (resource_type, counters) in &self.metadata {
            let metadata: MetricMetadata = counters
                .iter()
                .map(|(key, name)| (key.clone(), name.clone()))
                .collect();
            debug!("Staging {} counters for {}", metadata.len(), resource_type);
            update.set_metadata(*resource_type, metadata);
        }
        Ok(())
    }

    /// Stages every object with a fresh handle.
    ///
    /// Fails on the first duplicate `mo_id` within a resource type, after the
    /// objects before it have already been staged.
    pub fn populate_infrastructure<C: Clock>(
        &self,
        update: &mut CacheUpdate<'_, ResourceType, ObjectIndex, C>,
    ) -> Result<usize, FixtureError> {
        let mut seen: HashSet<(ResourceType, &str)> = HashSet::new();

        for entry in &self.objects {
            let resource_type = entry.object.resource_type;
            if !seen.insert((resource_type, entry.object.mo_id.as_str())) {
                return Err(FixtureError::DuplicateObject {
                    resource_type,
                    mo_id: entry.object.mo_id.clone(),
                });
            }

            let properties: ObjectProperties = entry
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            update.set_object_properties(entry.object.clone().into_ref(), properties);
        }

        Ok(seen.len())
    }

    /// Stages the complete tag content in one call.
    pub fn populate_tags<C: Clock>(
        &self,
        update: &mut CacheUpdate<'_, ResourceType, TagIndex, C>,
    ) -> Result<(), FixtureError> {
        let all: TagsByType = self
            .tags
            .iter()
            .map(|(resource_type, by_id)| {
                let index: TagIndex = by_id
                    .iter()
                    .map(|(mo_id, tags)| (mo_id.clone(), tags.clone()))
                    .collect();
                (*resource_type, index)
            })
            .collect();
        update.set_all_tags(all);
        Ok(())
    }
}
