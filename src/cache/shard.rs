//! Shard Module
//!
//! A fixed-capacity, lock-protected LRU store of entries. Every operation,
//! lookups included, takes the shard's exclusive lock because lookups
//! reorder recency.

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::trace;

use crate::cache::{CacheStats, Entry, LruTracker};

// == Lookup Outcome ==
/// Result of looking a key up in a shard.
#[derive(Debug, Clone)]
pub enum Lookup<V> {
    /// Live entry; it has been promoted to most recently used
    Hit(Entry<V>),
    /// The entry had expired and was removed
    Expired,
    /// No entry for the key
    Miss,
}

// == Shard State ==
/// Everything guarded by the shard lock.
#[derive(Debug)]
struct ShardState<V> {
    entries: HashMap<String, Entry<V>>,
    lru: LruTracker,
    stats: CacheStats,
}

impl<V> ShardState<V> {
    fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Entry<V>) -> bool,
    {
        let before = self.entries.len();
        let lru = &mut self.lru;
        self.entries.retain(|key, entry| {
            if predicate(entry) {
                lru.remove(key);
                false
            } else {
                true
            }
        });
        before - self.entries.len()
    }
}

// == Shard ==
/// One independently locked partition of the cache keyspace.
#[derive(Debug)]
pub struct Shard<V> {
    capacity: usize,
    state: Mutex<ShardState<V>>,
}

impl<V> Shard<V> {
    // == Constructor ==
    /// Creates an empty shard holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(ShardState {
                entries: HashMap::with_capacity(capacity),
                lru: LruTracker::with_capacity(capacity),
                stats: CacheStats::new(),
            }),
        }
    }

    // == Set ==
    /// Inserts or replaces `key` and promotes it to most recently used.
    ///
    /// If the shard then holds more than `capacity` entries, the least
    /// recently used entry is evicted regardless of its expiration state.
    /// Returns the evicted key, if any.
    pub fn set(&self, key: &str, entry: Entry<V>) -> Option<String> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        state.entries.insert(key.to_string(), entry);
        state.lru.touch(key);

        if state.entries.len() <= self.capacity {
            return None;
        }

        let evicted = state.lru.evict_oldest()?;
        state.entries.remove(&evicted);
        state.stats.record_eviction();
        trace!("Evicted least recently used key '{}'", evicted);
        Some(evicted)
    }

    // == Remove ==
    /// Removes `key`, returning whether it was present.
    pub fn remove(&self, key: &str) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.entries.remove(key).is_some() {
            state.lru.remove(key);
            true
        } else {
            false
        }
    }

    // == Clean ==
    /// Removes every entry for which `predicate` returns true.
    ///
    /// The predicate runs while the shard lock is held and must not call
    /// back into the cache. Returns the number of entries removed.
    pub fn clean<F>(&self, predicate: F) -> usize
    where
        F: FnMut(&Entry<V>) -> bool,
    {
        self.state.lock().remove_where(predicate)
    }

    /// Removes every entry expired as of `now`, counting them as expirations.
    pub fn clean_expired(&self, now: Instant) -> usize {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let removed = state.remove_where(|entry| entry.is_expired_at(now));
        state.stats.record_expirations(removed);
        removed
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of this shard's counters.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        let mut stats = state.stats.clone();
        stats.set_total_entries(state.entries.len());
        stats
    }
}

impl<V: Clone> Shard<V> {
    // == Lookup ==
    /// Looks `key` up as of `now`.
    ///
    /// A live entry is promoted to most recently used and returned as a copy.
    /// An entry past its expiration is removed on the spot.
    pub fn lookup(&self, key: &str, now: Instant) -> Lookup<V> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let expired = match state.entries.get(key) {
            None => {
                state.stats.record_miss();
                return Lookup::Miss;
            }
            Some(entry) => entry.is_expired_at(now),
        };

        if expired {
            state.entries.remove(key);
            state.lru.remove(key);
            state.stats.record_miss();
            state.stats.record_expirations(1);
            return Lookup::Expired;
        }

        state.lru.touch(key);
        state.stats.record_hit();
        match state.entries.get(key) {
            Some(entry) => Lookup::Hit(entry.clone()),
            None => Lookup::Miss,
        }
    }
}
