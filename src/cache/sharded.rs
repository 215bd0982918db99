//! Sharded Cache Module
//!
//! Routes keys to independently locked shards and owns the optional
//! background cleaner.

use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::cache::{CacheStats, Entry, Lookup, Shard};
use crate::config::Config;
use crate::context::Context;
use crate::error::Result;
use crate::tasks::{sweep, Cleaner, CleanerState};

// == Cached Value ==
/// A value returned by [`ShardedCache::get`].
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<V> {
    /// Copy of the stored value
    pub value: V,
    /// When the value was stored
    pub stored_at: DateTime<Utc>,
}

// == Sharded Cache ==
/// Bounded, concurrency-safe cache split into `shard_count` LRU shards.
///
/// Each key maps to exactly one shard for the lifetime of the cache, and a
/// call never holds more than one shard lock. Total size never exceeds
/// `shard_count * per_shard_capacity`.
///
/// Values are copied out on [`get`](Self::get), so mutating a returned value
/// never changes what is cached. Store an `Arc<T>` to share instead of copy;
/// the inner value must then be treated as immutable.
#[derive(Debug)]
pub struct ShardedCache<V> {
    shards: Arc<[Shard<V>]>,
    hasher: RandomState,
    per_shard_capacity: usize,
    /// Set once at construction; the cleaner itself is kept after it stops
    has_cleaner: bool,
    cleaner: Mutex<Option<Cleaner>>,
}

impl<V> ShardedCache<V>
where
    V: Clone + Send + 'static,
{
    // == Constructor ==
    /// Creates a cache of `shard_count` shards holding `per_shard_capacity`
    /// entries each.
    ///
    /// A non-zero `cleaner_interval` starts a background cleaner; zero leaves
    /// expiration purely lazy. A `shard_count` of zero is treated as one.
    ///
    /// The cleaner runs on the current Tokio runtime. Outside a runtime no
    /// cleaner is started and expiration stays lazy.
    pub fn new(shard_count: usize, per_shard_capacity: usize, cleaner_interval: Duration) -> Self {
        let shard_count = shard_count.max(1);
        let shards: Arc<[Shard<V>]> = (0..shard_count)
            .map(|_| Shard::new(per_shard_capacity))
            .collect();

        let cleaner = if cleaner_interval.is_zero() {
            None
        } else if tokio::runtime::Handle::try_current().is_err() {
            warn!(
                "No Tokio runtime available, cache cleaner disabled (interval {:?})",
                cleaner_interval
            );
            None
        } else {
            Some(Cleaner::spawn(Arc::clone(&shards), cleaner_interval))
        };

        info!(
            "Cache initialized: shards={}, shard_capacity={}, cleaner_interval={:?}",
            shard_count, per_shard_capacity, cleaner_interval
        );

        Self {
            shards,
            hasher: RandomState::new(),
            per_shard_capacity,
            has_cleaner: cleaner.is_some(),
            cleaner: Mutex::new(cleaner),
        }
    }

    /// Creates a cache from a loaded [`Config`].
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.shard_count,
            config.shard_capacity,
            config.cleaner_interval,
        )
    }

    // == Store ==
    /// Stores `value` under `key` for `ttl`, promoting it to most recently
    /// used in its shard.
    ///
    /// A zero `ttl` means the entry never expires, though it can still be
    /// evicted. Fails without mutating anything if `ctx` is already done.
    pub fn store(&self, ctx: &Context, key: &str, value: V, ttl: Duration) -> Result<()> {
        ctx.check()?;
        self.shard(key).set(key, Entry::new(value, ttl));
        Ok(())
    }

    // == Get ==
    /// Returns a copy of the live value stored under `key`.
    ///
    /// An expired entry is removed and reported as absent. Fails without
    /// touching the cache if `ctx` is already done.
    pub fn get(&self, ctx: &Context, key: &str) -> Result<Option<Cached<V>>> {
        ctx.check()?;
        match self.shard(key).lookup(key, Instant::now()) {
            Lookup::Hit(entry) => Ok(Some(Cached {
                value: entry.value,
                stored_at: entry.stored_at,
            })),
            Lookup::Expired | Lookup::Miss => Ok(None),
        }
    }
}

impl<V> ShardedCache<V> {
    // == Remove ==
    /// Removes `key`, returning whether it was present.
    pub fn remove(&self, ctx: &Context, key: &str) -> Result<bool> {
        ctx.check()?;
        Ok(self.shard(key).remove(key))
    }

    // == Clean ==
    /// Removes every entry for which `predicate` returns true, one shard at
    /// a time. Returns the number of entries removed.
    ///
    /// The predicate runs under each shard's lock and must not call back
    /// into this cache.
    pub fn clean<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&Entry<V>) -> bool,
    {
        self.shards
            .iter()
            .map(|shard| shard.clean(&mut predicate))
            .sum()
    }

    /// Runs the cleaner's sweep once on the calling thread.
    pub fn purge_expired(&self) -> usize {
        sweep(&self.shards, Instant::now())
    }

    // == Length ==
    /// Sum of every shard's entry count, taken shard by shard.
    ///
    /// Not a consistent snapshot while other threads are writing.
    pub fn len(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Maximum number of entries the cache can hold.
    pub fn capacity(&self) -> usize {
        self.shards.len().saturating_mul(self.per_shard_capacity)
    }

    /// Index of the shard `key` is routed to.
    pub fn shard_index(&self, key: &str) -> usize {
        (self.hasher.hash_one(key) % self.shards.len() as u64) as usize
    }

    // == Stats ==
    /// Merged counters of all shards; best-effort like [`len`](Self::len).
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::new();
        for shard in self.shards.iter() {
            stats.merge(&shard.stats());
        }
        stats
    }

    /// State of the background cleaner, or None when it was never started.
    ///
    /// Reports `Running` while a [`close`](Self::close) is still waiting for
    /// the task to exit.
    pub fn cleaner_state(&self) -> Option<CleanerState> {
        if !self.has_cleaner {
            return None;
        }
        match self.cleaner.try_lock() {
            Ok(cleaner) => cleaner.as_ref().map(Cleaner::state),
            Err(_) => Some(CleanerState::Running),
        }
    }

    // == Close ==
    /// Stops the background cleaner and waits for it to exit.
    ///
    /// Idempotent. Concurrent callers all wait for the same stop, so none
    /// returns while the task is still alive. Stored entries are kept and the
    /// cache stays usable; expiration simply becomes lazy afterwards.
    pub async fn close(&self) {
        let mut cleaner = self.cleaner.lock().await;
        if let Some(cleaner) = cleaner.as_mut() {
            cleaner.stop().await;
        }
    }

    fn shard(&self, key: &str) -> &Shard<V> {
        &self.shards[self.shard_index(key)]
    }
}
