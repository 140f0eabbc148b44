//! Bounded TTL cache used to avoid redundant embedding and retrieval calls.
//!
//! The pipeline keeps two independent instances: normalized question text to
//! embedding vector, and the same key to retrieval results. Each is bounded by
//! entry count and expiry, evicting least-recently-used entries first. Expired
//! entries are purged lazily on lookup; there is no background sweeper.
//!
//! The internal lock is a plain [`parking_lot::Mutex`] held only for the
//! synchronous map mutation, never across an await point, so cache traffic
//! cannot stall unrelated requests.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Instant;

use parking_lot::Mutex;

use crate::config::CacheSettings;

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    /// Monotonic recency tick; larger means more recently used.
    touched: u64,
}

struct CacheInner<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    tick: u64,
}

/// Generic least-recently-used, time-expiring cache.
///
/// A cache configured with `max_size == 0` or a zero TTL is a no-op: `set`
/// stores nothing and `get` always misses.
pub struct TtlCache<K, V> {
    settings: CacheSettings,
    inner: Mutex<CacheInner<K, V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            settings,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                tick: 0,
            }),
        }
    }

    /// Looks up `key`, removing it if expired.
    ///
    /// A hit refreshes the key's recency position but does not extend its
    /// expiry.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Stores `value` under `key` with a fresh TTL, then evicts
    /// least-recently-used entries until the size bound holds.
    pub fn set(&self, key: K, value: V) {
        self.set_at(key, value, Instant::now());
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let mut inner = self.inner.lock();
        let expired = match inner.entries.get(key) {
            None => return None,
            Some(entry) => entry.expires_at <= now,
        };
        if expired {
            inner.entries.remove(key);
            return None;
        }
        inner.tick += 1;
        let tick = inner.tick;
        if let Some(entry) = inner.entries.get_mut(key) {
            entry.touched = tick;
            return Some(entry.value.clone());
        }
        None
    }

    fn set_at(&self, key: K, value: V, now: Instant) {
        if self.settings.is_disabled() {
            return;
        }
        let mut inner = self.inner.lock();
        inner.tick += 1;
        let tick = inner.tick;
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + self.settings.ttl,
                touched: tick,
            },
        );
        // Bound sizes here are small (tens to hundreds), so a linear scan for
        // the stalest entry is cheaper than extra bookkeeping structures.
        while inner.entries.len() > self.settings.max_size {
            let stalest = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.touched)
                .map(|(key, _)| key.clone());
            match stalest {
                Some(key) => {
                    inner.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}
