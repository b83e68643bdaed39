//! String-keyed memoization with time-boxed entries.
//!
//! [`MemoCache`] memoizes computations under a stringified-argument key.
//! Entries older than the cache's TTL are treated as absent and recomputed
//! on next access; individual calls can opt out of both lookup and storage
//! with [`CachePolicy::Bypass`].
//!
//! The storage router memoizes shape-to-adapter routing decisions this way,
//! and the TTL keeps stale routes from outliving adapter registration for
//! long. Locking is a `parking_lot::RwLock` held only for map access, never
//! across the compute closure of a bypassed call.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Per-call cache participation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CachePolicy {
    /// Consult the cache and store the computed result.
    #[default]
    Use,
    /// Recompute unconditionally and leave the cache untouched.
    Bypass,
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// Memoization cache keyed by stringified arguments.
///
/// Values are cloned out on every hit, so `V` should be cheap to clone
/// (`Arc`-backed handles, small enums, ids).
pub struct MemoCache<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
    ttl: Duration,
}

impl<V: Clone> MemoCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up `key`, honoring entry age. Expired entries are removed.
    pub fn get(&self, key: &str) -> Option<V> {
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Entry exists but has expired.
        self.entries.write().remove(key);
        None
    }

    /// Store `value` under `key`, resetting its age.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.entries.write().insert(
            key.into(),
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Return the cached value for `key` or compute, store, and return it.
    ///
    /// With [`CachePolicy::Bypass`] the cache is neither consulted nor
    /// updated.
    pub fn get_or_insert_with(
        &self,
        key: &str,
        policy: CachePolicy,
        compute: impl FnOnce() -> V,
    ) -> V {
        if policy == CachePolicy::Bypass {
            return compute();
        }
        if let Some(hit) = self.get(key) {
            return hit;
        }
        let value = compute();
        self.insert(key, value.clone());
        value
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.write().remove(key);
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of entries currently stored, including any not yet expired-out.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<V> fmt::Debug for MemoCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoCache")
            .field("entries", &self.entries.read().len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn caches_computed_values() {
        let cache: MemoCache<String> = MemoCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            "value".to_string()
        };

        assert_eq!(cache.get_or_insert_with("k", CachePolicy::Use, compute), "value");
        assert_eq!(cache.get_or_insert_with("k", CachePolicy::Use, compute), "value");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn bypass_recomputes_and_skips_storage() {
        let cache: MemoCache<u32> = MemoCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            7
        };

        assert_eq!(cache.get_or_insert_with("k", CachePolicy::Bypass, compute), 7);
        assert_eq!(cache.get_or_insert_with("k", CachePolicy::Bypass, compute), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache: MemoCache<u32> = MemoCache::new(Duration::from_millis(10));
        cache.insert("k", 1);
        assert_eq!(cache.get("k"), Some(1));

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("k"), None);

        // A fresh store resets the clock.
        cache.insert("k", 2);
        assert_eq!(cache.get("k"), Some(2));
    }

    #[test]
    fn invalidate_removes_single_key() {
        let cache: MemoCache<u32> = MemoCache::new(Duration::from_secs(60));
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.invalidate("a");
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));
    }
}
