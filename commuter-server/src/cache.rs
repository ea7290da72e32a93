//! Bounded, time-expiring cache for feed responses.
//!
//! Two datasets go through it: the station list (one fixed key, long TTL)
//! and train lists keyed by `"{origin}-{destination}"` (short TTL). Entries
//! older than the TTL are invisible to [`ResponseCache::get`], but the last
//! value stored for a key stays reachable through
//! [`ResponseCache::get_stale`] so callers can ride out upstream failures.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;

/// Cache limits. Not runtime-configurable.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for the station list.
    pub station_ttl: Duration,

    /// TTL for train lists.
    pub train_ttl: Duration,

    /// Maximum number of live entries per cache.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            station_ttl: Duration::from_secs(60 * 60),
            train_ttl: Duration::from_secs(10),
            max_entries: 100,
        }
    }
}

/// A stored value with its insertion time.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub data: V,
    pub stored_at: Instant,
    /// Insertion counter, breaks ties between equal timestamps.
    seq: u64,
}

/// Key-value cache with a TTL and an entry bound.
///
/// Eviction is by insertion time, not access time: reads never refresh an
/// entry. Not internally synchronized; wrap it in a mutex to share it.
#[derive(Debug)]
pub struct ResponseCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    /// Expired or evicted entries, kept for [`ResponseCache::get_stale`].
    retired: HashMap<K, CacheEntry<V>>,
    ttl: Duration,
    max_entries: usize,
    next_seq: u64,
}

impl<K, V> ResponseCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            retired: HashMap::new(),
            ttl,
            max_entries,
            next_seq: 0,
        }
    }

    /// Returns the value if it is no older than the TTL.
    ///
    /// An expired entry is evicted and reported as absent.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let entry = self.entries.get(key)?;
        if entry.stored_at.elapsed() <= self.ttl {
            return Some(entry.data.clone());
        }

        if let Some(expired) = self.entries.remove(key) {
            self.retire(key.clone(), expired);
        }
        None
    }

    /// Stores `value` under `key`, then evicts the oldest entries while the
    /// cache is over its bound.
    pub fn set(&mut self, key: K, value: V) {
        self.retired.remove(&key);
        let entry = CacheEntry {
            data: value,
            stored_at: Instant::now(),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.entries.insert(key, entry);

        while self.entries.len() > self.max_entries {
            let Some(oldest) = oldest_key(&self.entries) else {
                break;
            };
            if let Some(evicted) = self.entries.remove(&oldest) {
                self.retire(oldest, evicted);
            }
        }
    }

    /// The most recent value stored for `key`, regardless of age.
    ///
    /// This is the fallback path for failed refreshes and is the only way to
    /// see an entry that has expired.
    pub fn get_stale(&self, key: &K) -> Option<V> {
        self.entries
            .get(key)
            .or_else(|| self.retired.get(key))
            .map(|entry| entry.data.clone())
    }

    /// Number of live entries. Retired entries are not counted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drops everything, including stale fallbacks.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.retired.clear();
    }

    fn retire(&mut self, key: K, entry: CacheEntry<V>) {
        self.retired.insert(key, entry);
        while self.retired.len() > self.max_entries {
            let Some(oldest) = oldest_key(&self.retired) else {
                break;
            };
            self.retired.remove(&oldest);
        }
    }
}

fn oldest_key<K: Clone, V>(entries: &HashMap<K, CacheEntry<V>>) -> Option<K> {
    entries
        .iter()
        .min_by_key(|(_, entry)| (entry.stored_at, entry.seq))
        .map(|(key, _)| key.clone())
}
