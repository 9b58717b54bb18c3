//! TTL cache with per-key in-flight locks.
//!
//! A single coarse mutex guards both the entry map and the lock map and is
//! held only for the map operation itself. Callers that need to compute a
//! missing value take the per-key async lock from [`TtlCache::lock_for`],
//! re-check the cache, and only then do the expensive work, so concurrent
//! misses for the same key result in one computation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex as AsyncMutex;

use crate::clock::Clock;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    payload: V,
    expires_at: DateTime<Utc>,
}

struct CacheMaps<V> {
    entries: HashMap<String, CacheEntry<V>>,
    inflight: HashMap<String, Arc<AsyncMutex<()>>>,
}

pub struct TtlCache<V> {
    maps: Mutex<CacheMaps<V>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            maps: Mutex::new(CacheMaps {
                entries: HashMap::new(),
                inflight: HashMap::new(),
            }),
            clock,
        }
    }

    /// Cached payload for `key`; expired entries are removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut maps = self.maps();
        match maps.entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.payload.clone()),
            Some(_) => {
                maps.entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: impl Into<String>, payload: V, ttl: Duration) {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut maps = self.maps();
        maps.entries.insert(key.into(), CacheEntry { payload, expires_at });
        // Locks nobody holds a handle to can be recreated on demand.
        maps.inflight.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// The in-flight lock for `key`, created on first use.
    pub fn lock_for(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut maps = self.maps();
        maps.inflight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Number of stored entries, including expired ones not yet looked up.
    pub fn len(&self) -> usize {
        self.maps().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn maps(&self) -> MutexGuard<'_, CacheMaps<V>> {
        self.maps.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn manual_clock() -> Arc<ManualClock> {
        let start = DateTime::parse_from_rfc3339("2026-10-18T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        Arc::new(ManualClock::new(start))
    }

    #[test]
    fn entries_expire_lazily() {
        let clock = manual_clock();
        let cache: TtlCache<u32> = TtlCache::new(clock.clone());
        cache.set("a", 7, Duration::from_secs(300));
        assert_eq!(cache.get("a"), Some(7));

        clock.advance(chrono::Duration::seconds(299));
        assert_eq!(cache.get("a"), Some(7));
        assert_eq!(cache.len(), 1);

        clock.advance(chrono::Duration::seconds(1));
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn missing_key_is_a_miss() {
        let cache: TtlCache<String> = TtlCache::new(manual_clock());
        assert_eq!(cache.get("nope"), None);
    }

    #[test]
    fn lock_for_is_shared_per_key() {
        let cache: TtlCache<u32> = TtlCache::new(manual_clock());
        let a1 = cache.lock_for("a");
        let a2 = cache.lock_for("a");
        let b = cache.lock_for("b");
        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
    }

    #[test]
    fn idle_locks_are_dropped_on_set() {
        let cache: TtlCache<u32> = TtlCache::new(manual_clock());
        let held = cache.lock_for("held");
        drop(cache.lock_for("idle"));
        cache.set("x", 1, Duration::from_secs(1));
        let maps = cache.maps();
        assert!(maps.inflight.contains_key("held"));
        assert!(!maps.inflight.contains_key("idle"));
        drop(maps);
        drop(held);
    }

    #[tokio::test]
    async fn concurrent_misses_compute_once() {
        let cache: Arc<TtlCache<u32>> = Arc::new(TtlCache::new(manual_clock()));
        let computed = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let computed = computed.clone();
            handles.push(tokio::spawn(async move {
                if let Some(hit) = cache.get("k") {
                    return hit;
                }
                let lock = cache.lock_for("k");
                let _guard = lock.lock().await;
                if let Some(hit) = cache.get("k") {
                    return hit;
                }
                computed.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                cache.set("k", 42, Duration::from_secs(60));
                42
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 42);
        }
        assert_eq!(computed.load(Ordering::SeqCst), 1);
    }
}
