//! Cache Module
//!
//! Provides sharded in-memory caching with TTL expiration and per-shard LRU
//! eviction.

mod entry;
mod lru;
mod shard;
mod sharded;
mod stats;


// Re-export public types
pub use entry::Entry;
pub use lru::LruTracker;
pub use shard::{Lookup, Shard};
pub use sharded::{Cached, ShardedCache};
pub use stats::CacheStats;
