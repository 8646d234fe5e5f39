//! Time-bounded snapshot cache.
//!
//! This module provides `SnapshotCache`, a map whose whole content expires at
//! once after a fixed interval and is only ever replaced in bulk. Writers go
//! through a `CacheUpdate` handle that stages a brand new map; committing the
//! handle swaps the staged map in and stamps the update time, while dropping it
//! uncommitted throws the staged map away and leaves the previous snapshot and
//! timestamp exactly as they were.
//!
//! The cache is not synchronized. Callers sharing one across threads must wrap
//! it in their own lock.

use ahash::AHashMap as HashMap;
use chrono::{DateTime, Duration, Utc};
use std::hash::Hash;
use std::time::Instant;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};

const DEFAULT_CACHE_NAME: &str = "cache";

/// Bookkeeping about the most recent update attempts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStatus {
    /// Time of the last successful commit, `None` if never committed.
    pub last_updated: Option<DateTime<Utc>>,
    /// Wall time spent in the last update scope, committed or not.
    pub last_update_duration: Option<std::time::Duration>,
    /// Outcome of the last update scope, `None` before the first attempt.
    pub last_attempt_succeeded: Option<bool>,
    /// Rollbacks since the last successful commit.
    pub consecutive_failures: u64,
    /// Number of first-level keys in the live snapshot.
    pub entries: usize,
}

/// A cache with a single time-to-live covering all of its content.
pub struct SnapshotCache<K, V, C = SystemClock> {
    name: &'static str,
    content: HashMap<K, V>,
    interval_seconds: u64,
    interval: Duration,
    clock: C,
    status: CacheStatus,
}

impl<K, V> SnapshotCache<K, V, SystemClock>
where
    K: Eq + Hash,
{
    /// Creates an empty cache that expires `interval_seconds` after each commit.
    ///
    /// A new cache has never been committed and therefore reports expired.
    pub fn new(interval_seconds: u64) -> Self {
        Self::with_clock(interval_seconds, SystemClock)
    }
}

impl<K, V, C> SnapshotCache<K, V, C>
where
    K: Eq + Hash,
    C: Clock,
{
    pub fn with_clock(interval_seconds: u64, clock: C) -> Self {
        // Intervals too large for chrono never expire in practice.
        let interval = i64::try_from(interval_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);

        Self {
            name: DEFAULT_CACHE_NAME,
            content: HashMap::new(),
            interval_seconds,
            interval,
            clock,
            status: CacheStatus::default(),
        }
    }

    /// Sets the name used in log lines and telemetry labels.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn interval_seconds(&self) -> u64 {
        self.interval_seconds
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.status.last_updated
    }

    pub fn status(&self) -> &CacheStatus {
        &self.status
    }

    /// True when more than the interval has elapsed since the last commit.
    ///
    /// Exactly `interval` seconds after a commit the cache is still fresh.
    pub fn is_expired(&self) -> bool {
        match self.status.last_updated {
            None => true,
            Some(ts) => self.clock.now() - ts > self.interval,
        }
    }

    /// Number of first-level keys in the live snapshot.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn content(&self) -> &HashMap<K, V> {
        &self.content
    }

    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        self.content.get(key)
    }

    /// Opens an update scope backed by an empty staging map.
    ///
    /// Nothing is visible to readers until [`CacheUpdate::commit`]. Dropping
    /// the handle without committing rolls the update back.
    pub fn begin_update(&mut self) -> CacheUpdate<'_, K, V, C> {
        debug!(cache = self.name, "Beginning cache update");
        CacheUpdate {
            cache: self,
            staging: HashMap::new(),
            started: Instant::now(),
            committed: false,
        }
    }

    /// Runs `populate` inside an update scope.
    ///
    /// On `Ok` the staged content replaces the snapshot. On `Err` the staged
    /// content is discarded, the previous snapshot and timestamp are kept, and
    /// the error is returned unchanged.
    pub fn update<F, E>(&mut self, populate: F) -> Result<(), E>
    where
        F: FnOnce(&mut CacheUpdate<'_, K, V, C>) -> Result<(), E>,
    {
        let mut scope = self.begin_update();
        populate(&mut scope)?;
        scope.commit();
        Ok(())
    }
}

/// Scoped handle over a staging map. See [`SnapshotCache::begin_update`].
pub struct CacheUpdate<'a, K, V, C> {
    cache: &'a mut SnapshotCache<K, V, C>,
    staging: HashMap<K, V>,
    started: Instant,
    committed: bool,
}

impl<'a, K, V, C> CacheUpdate<'a, K, V, C>
where
    K: Eq + Hash,
    C: Clock,
{
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.staging.insert(key, value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.staging.get(key)
    }

    pub(crate) fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        self.staging.entry(key).or_insert_with(default)
    }

    /// Replaces everything staged so far.
    pub fn replace_all(&mut self, content: HashMap<K, V>) {
        self.staging = content;
    }

    /// Content staged so far in this scope.
    pub fn staged(&self) -> &HashMap<K, V> {
        &self.staging
    }

    /// Swaps the staged map in as the new snapshot and stamps the update time.
    ///
    /// Returns the number of first-level keys now cached.
    pub fn commit(mut self) -> usize {
        let now = self.cache.clock.now();
        let staged = std::mem::take(&mut self.staging);
        let cache = &mut *self.cache;

        cache.content = staged;
        cache.status = CacheStatus {
            last_updated: Some(now),
            last_update_duration: Some(self.started.elapsed()),
            last_attempt_succeeded: Some(true),
            consecutive_failures: 0,
            entries: cache.content.len(),
        };
        self.committed = true;

        debug!(
            cache = cache.name,
            entries = cache.status.entries,
            "Cache update committed"
        );
        cache.status.entries
    }
}

impl<K, V, C> Drop for CacheUpdate<'_, K, V, C> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        let status = &mut self.cache.status;
        status.last_update_duration = Some(self.started.elapsed());
        status.last_attempt_succeeded = Some(false);
        status.consecutive_failures += 1;

        warn!(
            cache = self.cache.name,
            consecutive_failures = status.consecutive_failures,
            "Cache update rolled back, previous snapshot kept"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn cache_with_clock(interval: u64) -> (SnapshotCache<String, u32, ManualClock>, ManualClock) {
        let clock = ManualClock::at_epoch();
        (SnapshotCache::with_clock(interval, clock.clone()), clock)
    }

    #[test]
    fn test_new_cache_is_expired() {
        let (cache, _) = cache_with_clock(5);
        assert!(cache.is_expired());
        assert!(cache.last_updated().is_none());

        let wall: SnapshotCache<String, u32> = SnapshotCache::new(3600);
        assert!(wall.is_expired());
    }

    #[test]
    fn test_expiry_timeline() {
        let (mut cache, clock) = cache_with_clock(5);

        cache.update(|_| Ok::<_, String>(())).unwrap();
        assert!(!cache.is_expired());

        clock.advance_secs(4);
        assert!(!cache.is_expired());

        clock.advance_secs(1);
        assert!(!cache.is_expired(), "exactly the interval is still fresh");

        clock.advance(Duration::milliseconds(1));
        assert!(cache.is_expired());

        clock.advance_secs(1);
        assert!(cache.is_expired());
    }

    #[test]
    fn test_commit_replaces_instead_of_merging() {
        let (mut cache, _) = cache_with_clock(60);

        cache
            .update(|u| {
                u.insert("a".into(), 1);
                u.insert("b".into(), 2);
                Ok::<_, String>(())
            })
            .unwrap();

        cache
            .update(|u| {
                u.insert("c".into(), 3);
                Ok::<_, String>(())
            })
            .unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"c".to_string()), Some(&3));
        assert!(cache.get(&"a".to_string()).is_none());
    }

    #[test]
    fn test_failed_update_restores_content_and_timestamp() {
        let (mut cache, clock) = cache_with_clock(5);

        cache
            .update(|u| {
                u.insert("a".into(), 1);
                Ok::<_, String>(())
            })
            .unwrap();
        let committed_at = cache.last_updated();

        clock.advance_secs(10);
        assert!(cache.is_expired());

        let err = cache
            .update(|u| {
                u.insert("b".into(), 2);
                Err("fetch failed".to_string())
            })
            .unwrap_err();

        assert_eq!(err, "fetch failed");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(&1));
        assert_eq!(cache.last_updated(), committed_at);
        assert!(cache.is_expired());
    }

    #[test]
    fn test_staging_starts_empty() {
        let (mut cache, _) = cache_with_clock(5);
        cache
            .update(|u| {
                u.insert("a".into(), 1);
                Ok::<_, String>(())
            })
            .unwrap();

        let mut scope = cache.begin_update();
        assert!(scope.staged().is_empty());
        assert!(scope.get(&"a".to_string()).is_none());
        scope.insert("b".into(), 2);
        assert_eq!(scope.get(&"b".to_string()), Some(&2));
    }

    #[test]
    fn test_dropped_scope_rolls_back() {
        let (mut cache, _) = cache_with_clock(5);

        {
            let mut scope = cache.begin_update();
            scope.insert("a".into(), 1);
        }

        assert!(cache.is_empty());
        assert!(cache.is_expired());
        assert_eq!(cache.status().last_attempt_succeeded, Some(false));
        assert_eq!(cache.status().consecutive_failures, 1);
    }

    #[test]
    fn test_status_resets_after_success() {
        let (mut cache, _) = cache_with_clock(5);

        let _ = cache.update(|_| Err::<(), _>("boom"));
        let _ = cache.update(|_| Err::<(), _>("boom"));
        assert_eq!(cache.status().consecutive_failures, 2);

        cache
            .update(|u| {
                u.insert("a".into(), 1);
                Ok::<_, &str>(())
            })
            .unwrap();

        let status = cache.status();
        assert_eq!(status.consecutive_failures, 0);
        assert_eq!(status.last_attempt_succeeded, Some(true));
        assert_eq!(status.entries, 1);
        assert!(status.last_update_duration.is_some());
    }

    #[test]
    fn test_panic_in_scope_rolls_back() {
        let (mut cache, _) = cache_with_clock(5);
        cache
            .update(|u| {
                u.insert("a".into(), 1);
                Ok::<_, String>(())
            })
            .unwrap();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = cache.update(|u| -> Result<(), String> {
                u.insert("b".into(), 2);
                panic!("collector crashed")
            });
        }));

        assert!(result.is_err());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(&1));
    }

    #[test]
    fn test_huge_interval_does_not_overflow() {
        let (mut cache, clock) = cache_with_clock(u64::MAX);
        cache.update(|_| Ok::<_, String>(())).unwrap();
        clock.advance_secs(365 * 24 * 3600);
        assert!(!cache.is_expired());
    }
}
