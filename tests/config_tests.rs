//! Integration tests for configuration and fixture loading.

use std::io::Write;
use tempfile::NamedTempFile;
use vsphere_snapshot_cache::config::{load_config, validate_config, ConfigError};
use vsphere_snapshot_cache::fixture::{load_fixture, FixtureError};
use vsphere_snapshot_cache::{
    refresh_if_expired, CacheConfig, CacheSet, ManagedObject, ManualClock, RefreshOutcome,
    ResourceType,
};

/// Helper function to write `content` to a temp file with the given suffix.
fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}

const FIXTURE_JSON: &str = r#"{
  "metadata": {
    "virtual_machine": {"2": "cpu.usage.avg", "24": "mem.usage.avg"}
  },
  "objects": [
    {"resource_type": "virtual_machine", "mo_id": "vm-1", "name": "db-01",
     "properties": {"runtime.powerState": "poweredOn"}},
    {"resource_type": "virtual_machine", "mo_id": "vm-2"},
    {"resource_type": "host_system", "mo_id": "host-1"}
  ],
  "tags": {
    "virtual_machine": {"vm-1": ["env:prod", "team:db"]}
  }
}"#;

#[test]
fn test_load_yaml_config() {
    let file = temp_file(
        ".yaml",
        "refresh_metrics_metadata_cache_interval: 600\ncollect-tags: true\n",
    );

    let config = load_config(Some(file.path())).unwrap();

    assert_eq!(config.refresh_metrics_metadata_cache_interval, 600);
    assert_eq!(config.refresh_infrastructure_cache_interval, 300);
    assert!(config.collect_tags);
}

#[test]
fn test_load_toml_config() {
    let file = temp_file(".toml", "refresh_infrastructure_cache_interval = 120\n");
    let config = load_config(Some(file.path())).unwrap();
    assert_eq!(config.refresh_infrastructure_cache_interval, 120);
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");

    let err = load_config(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_malformed_config() {
    let file = temp_file(".json", "{ not json");
    let err = load_config(Some(file.path())).unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));
}

#[test]
fn test_validate_rejects_millisecond_intervals() {
    let config = CacheConfig {
        refresh_metrics_metadata_cache_interval: 1_800_000,
        ..CacheConfig::default()
    };
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_fixture_populates_cache_set() {
    let file = temp_file(".json", FIXTURE_JSON);
    let fixture = load_fixture(file.path()).unwrap();

    let config = CacheConfig {
        collect_tags: true,
        ..CacheConfig::default()
    };
    let clock = ManualClock::at_epoch();
    let mut caches = CacheSet::with_clock(&config, clock.clone());

    refresh_if_expired(&mut caches.metrics_metadata, None, |u| {
        fixture.populate_metadata(u)
    })
    .unwrap();
    refresh_if_expired(&mut caches.infrastructure, None, |u| {
        fixture.populate_infrastructure(u).map(|_| ())
    })
    .unwrap();
    let tags = caches.tags.as_mut().unwrap();
    refresh_if_expired(tags, None, |u| fixture.populate_tags(u)).unwrap();

    let metadata = caches
        .metrics_metadata
        .get_metadata(ResourceType::VirtualMachine)
        .unwrap();
    assert_eq!(metadata.get("24").map(String::as_str), Some("mem.usage.avg"));
    assert!(caches
        .metrics_metadata
        .get_metadata(ResourceType::HostSystem)
        .is_none());

    let vms: Vec<_> = caches
        .infrastructure
        .get_objects_of_type(ResourceType::VirtualMachine)
        .cloned()
        .collect();
    assert_eq!(vms.len(), 2);

    let db = vms.iter().find(|o| o.mo_id() == "vm-1").unwrap();
    let props = caches.infrastructure.get_object_properties(db, None).unwrap();
    assert_eq!(props["runtime.powerState"], "poweredOn");

    let tags = caches.tags.as_ref().unwrap();
    assert_eq!(tags.get_object_tags(db), ["env:prod", "team:db"]);
    let lookalike = ManagedObject::new(ResourceType::VirtualMachine, "vm-2").into_ref();
    assert!(tags.get_object_tags(&lookalike).is_empty());

    // Within the interval the next check cycle leaves the caches alone.
    clock.advance_secs(299);
    let outcome = refresh_if_expired(&mut caches.infrastructure, None, |_| {
        Ok::<_, FixtureError>(())
    })
    .unwrap();
    assert_eq!(outcome, RefreshOutcome::Fresh);
}

#[test]
fn test_unreadable_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_fixture(&dir.path().join("missing.yaml")).unwrap_err();
    assert!(matches!(err, FixtureError::Io { .. }));
}
