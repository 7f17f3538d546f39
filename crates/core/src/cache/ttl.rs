use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use super::Clock;
use crate::metrics::{CACHE_INVALIDATIONS, CACHE_LOOKUPS};

/// Timestamp given to invalidated entries. Reads check for it explicitly, so
/// even a TTL longer than the distance to it never keeps an entry fresh.
const INVALIDATED_AT: DateTime<Utc> = DateTime::<Utc>::MIN_UTC;

/// A cached value together with when it was stored and how long it lives.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub data: V,
    pub timestamp: DateTime<Utc>,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    /// Fresh iff `now - timestamp < ttl`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.is_younger_than(now, self.ttl)
    }

    /// Same check as [`is_fresh_at`](Self::is_fresh_at) against an arbitrary
    /// window instead of the entry's own TTL. Invalidated entries are never
    /// younger than anything.
    pub fn is_younger_than(&self, now: DateTime<Utc>, window: Duration) -> bool {
        if self.is_invalidated() {
            return false;
        }
        let elapsed = now.signed_duration_since(self.timestamp);
        match TimeDelta::from_std(window) {
            Ok(window) => elapsed < window,
            Err(_) => true,
        }
    }

    pub fn is_invalidated(&self) -> bool {
        self.timestamp == INVALIDATED_AT
    }
}

/// Key to value store with per-key expiry.
///
/// Staleness is evaluated lazily on read. Invalidation marks an entry stale
/// instead of removing it, so every read goes through the same freshness
/// check.
#[derive(Debug)]
pub struct TtlCache<V> {
    name: &'static str,
    entries: HashMap<String, CacheEntry<V>>,
    clock: Arc<dyn Clock>,
}

impl<V> TtlCache<V> {
    /// Create an empty cache. `name` labels log lines and metrics.
    pub fn new(name: &'static str, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            entries: HashMap::new(),
            clock,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Get the value for `key` if it is still fresh.
    pub fn get(&self, key: &str) -> Option<&V> {
        let now = self.clock.now();
        let hit = self
            .entries
            .get(key)
            .filter(|entry| entry.is_fresh_at(now))
            .map(|entry| &entry.data);
        self.record_lookup(hit.is_some());
        hit
    }

    /// Get the value for `key` if it was stored less than `window` ago,
    /// regardless of the TTL it was stored with.
    pub fn get_within(&self, key: &str, window: Duration) -> Option<&V> {
        let now = self.clock.now();
        let hit = self
            .entries
            .get(key)
            .filter(|entry| entry.is_younger_than(now, window))
            .map(|entry| &entry.data);
        self.record_lookup(hit.is_some());
        hit
    }

    /// Store `value` under `key`, stamped with the current time.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        debug!(cache = self.name, key = %key, ttl_secs = ttl.as_secs(), "Cache entry stored");
        self.entries.insert(
            key,
            CacheEntry {
                data: value,
                timestamp: self.clock.now(),
                ttl,
            },
        );
    }

    /// Whether `key` holds a fresh entry. Does not count as a lookup.
    pub fn is_fresh(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.entries
            .get(key)
            .is_some_and(|entry| entry.is_fresh_at(now))
    }

    /// Mark `key` stale. Returns false if the key was never stored.
    pub fn invalidate(&mut self, key: &str) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.timestamp = INVALIDATED_AT;
                CACHE_INVALIDATIONS.with_label_values(&[self.name]).inc();
                true
            }
            None => false,
        }
    }

    /// Mark every entry whose key starts with `prefix` stale, or every entry
    /// when no prefix is given. Returns the number of entries touched.
    pub fn invalidate_all(&mut self, prefix: Option<&str>) -> usize {
        let mut count = 0;
        for (key, entry) in self.entries.iter_mut() {
            if prefix.map_or(true, |p| key.starts_with(p)) {
                entry.timestamp = INVALIDATED_AT;
                count += 1;
            }
        }
        if count > 0 {
            CACHE_INVALIDATIONS
                .with_label_values(&[self.name])
                .inc_by(count as u64);
        }
        debug!(cache = self.name, prefix = ?prefix, count, "Cache entries invalidated");
        count
    }

    /// Raw entry access, fresh or not.
    pub fn entry(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn record_lookup(&self, hit: bool) {
        let result = if hit { "hit" } else { "miss" };
        CACHE_LOOKUPS.with_label_values(&[self.name, result]).inc();
    }
}
