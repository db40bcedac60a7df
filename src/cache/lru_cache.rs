//! Fixed-capacity least-recently-used map.
//!
//! Recency order is total: every `get` hit and every `set` moves the key to
//! the most-recent end. When a new key would exceed capacity the
//! least-recently-used entry is evicted first.

use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;

/// Cache statistics for observability.
///
/// Passive only: counters never influence eviction.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of `get` calls that found the key.
    pub hits: u64,
    /// Number of `get` calls that missed.
    pub misses: u64,
    /// Number of entries evicted due to capacity.
    pub evictions: u64,
}

/// LRU cache with optional capacity.
///
/// - `None` capacity: unbounded, nothing is ever evicted
/// - `Some(0)`: stores nothing
pub struct LruCache<K, V> {
    /// Backing store; `None` when the capacity is zero.
    entries: Option<lru::LruCache<K, V>>,
    capacity: Option<usize>,
    stats: CacheStats,
}

impl<K: Hash + Eq, V> LruCache<K, V> {
    /// Create a cache holding at most `capacity` entries (`None` = unbounded).
    pub fn new(capacity: Option<usize>) -> Self {
        let entries = match capacity {
            None => Some(lru::LruCache::unbounded()),
            Some(n) => NonZeroUsize::new(n).map(lru::LruCache::new),
        };
        Self {
            entries,
            capacity,
            stats: CacheStats::default(),
        }
    }

    /// Create an unbounded cache.
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Look up `key`, marking it most-recently used on a hit.
    ///
    /// Callers wanting a default use `get(..).unwrap_or(default)`.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let found = self.entries.as_mut().and_then(|entries| entries.get(key));
        if found.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        found
    }

    /// Insert or overwrite `key`.
    ///
    /// Overwriting an existing key never consumes capacity.
    pub fn set(&mut self, key: K, value: V) {
        let Some(entries) = self.entries.as_mut() else {
            return;
        };
        let existed = entries.contains(&key);
        if entries.push(key, value).is_some() && !existed {
            self.stats.evictions += 1;
        }
    }

    /// Remove `key`, returning its value.
    pub fn delete(&mut self, key: &K) -> Option<V> {
        self.entries.as_mut().and_then(|entries| entries.pop(key))
    }

    /// Membership test. Does not change recency.
    pub fn contains(&self, key: &K) -> bool {
        self.entries
            .as_ref()
            .map(|entries| entries.contains(key))
            .unwrap_or(false)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.as_ref().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured capacity (`None` = unbounded).
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Keys from least- to most-recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries
            .iter()
            .flat_map(|entries| entries.iter().rev().map(|(key, _)| key))
    }

    /// Drop every entry. Statistics are kept.
    pub fn clear(&mut self) {
        if let Some(entries) = self.entries.as_mut() {
            entries.clear();
        }
    }

    /// Get cache statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl<K, V> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
