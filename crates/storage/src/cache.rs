// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded TTL cache shared by every repository instantiation.
//!
//! One mutex guards the map; hit/miss/eviction counts are atomics so
//! callers can read them without taking the lock.

use parking_lot::Mutex;
use pulseone_core::Clock;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

const DEFAULT_MAX_SIZE: usize = 1000;
const DEFAULT_TTL_MS: u64 = 300_000;

struct CacheEntry<V> {
    value: V,
    cached_at_ms: u64,
}

/// A bounded, TTL-expiring cache keyed by entity id.
///
/// Eviction is approximate-LRU: expired entries are dropped first, then
/// the entry with the oldest `cached_at_ms` if the cache is still full.
pub struct Cache<K, V> {
    clock: Arc<dyn Clock>,
    max_size: usize,
    ttl_ms: u64,
    enabled: AtomicBool,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<K, V> Cache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_limits(clock, DEFAULT_MAX_SIZE, DEFAULT_TTL_MS)
    }

    pub fn with_limits(clock: Arc<dyn Clock>, max_size: usize, ttl_ms: u64) -> Self {
        Self {
            clock,
            max_size,
            ttl_ms,
            enabled: AtomicBool::new(true),
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        if !enabled {
            self.entries.lock().clear();
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        if !self.enabled.load(Ordering::Relaxed) {
            return None;
        }
        let now = self.clock.epoch_ms();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if now.saturating_sub(entry.cached_at_ms) < self.ttl_ms => {
                let value = entry.value.clone();
                drop(entries);
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            Some(_) => {
                entries.remove(key);
                drop(entries);
                self.misses.fetch_add(1, Ordering::Relaxed);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                drop(entries);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn put(&self, key: K, value: V) {
        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }
        let now = self.clock.epoch_ms();
        let mut entries = self.entries.lock();
        if entries.len() >= self.max_size && !entries.contains_key(&key) {
            self.evict_one(&mut entries, now);
        }
        entries.insert(
            key,
            CacheEntry {
                value,
                cached_at_ms: now,
            },
        );
    }

    fn evict_one(&self, entries: &mut HashMap<K, CacheEntry<V>>, now: u64) {
        let expired = entries
            .iter()
            .find(|(_, e)| now.saturating_sub(e.cached_at_ms) >= self.ttl_ms)
            .map(|(k, _)| k.clone());
        let victim = expired.or_else(|| {
            entries
                .iter()
                .min_by_key(|(_, e)| e.cached_at_ms)
                .map(|(k, _)| k.clone())
        });
        if let Some(victim) = victim {
            entries.remove(&victim);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn invalidate(&self, key: &K) {
        self.entries.lock().remove(key);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let misses = self.misses() as f64;
        if hits + misses == 0.0 {
            0.0
        } else {
            hits / (hits + misses)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulseone_core::FakeClock;

    fn cache(max_size: usize, ttl_ms: u64) -> (Cache<u32, String>, Arc<FakeClock>) {
        let clock = Arc::new(FakeClock::new());
        let cache = Cache::with_limits(clock.clone(), max_size, ttl_ms);
        (cache, clock)
    }

    #[test]
    fn miss_then_hit() {
        let (cache, _clock) = cache(10, 60_000);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.misses(), 1);
        cache.put(1, "a".to_string());
        assert_eq!(cache.get(&1), Some("a".to_string()));
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn ttl_expires_entries() {
        let (cache, clock) = cache(10, 1000);
        cache.put(1, "a".to_string());
        clock.advance(1001);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.evictions(), 1);
    }

    #[test]
    fn eviction_bound_never_exceeds_max_size() {
        let (cache, _clock) = cache(3, 60_000);
        for (k, v) in [(1, "a"), (2, "b"), (3, "c"), (4, "d"), (5, "e")] {
            cache.put(k, v.to_string());
            assert!(cache.len() <= 3);
        }
        assert_eq!(cache.len(), 3);
        assert!(cache.evictions() >= 2);
    }

    #[test]
    fn lru_under_pressure_matches_scenario_six() {
        let (cache, _clock) = cache(3, 60_000);
        for id in 1..=5u32 {
            cache.put(id, format!("v{id}"));
        }
        assert_eq!(cache.get(&1), None, "id 1 should have been evicted");
        for id in [3u32, 4, 5] {
            assert_eq!(cache.get(&id), Some(format!("v{id}")), "id {id} should still be cached");
        }
    }

    #[test]
    fn disabling_cache_clears_and_stops_serving() {
        let (cache, _clock) = cache(10, 60_000);
        cache.put(1, "a".to_string());
        cache.set_enabled(false);
        assert_eq!(cache.get(&1), None);
        cache.set_enabled(true);
        assert_eq!(cache.get(&1), None);
    }

    #[test]
    fn invalidate_removes_single_entry() {
        let (cache, _clock) = cache(10, 60_000);
        cache.put(1, "a".to_string());
        cache.put(2, "b".to_string());
        cache.invalidate(&1);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some("b".to_string()));
    }
}
