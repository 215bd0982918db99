//! Resolver Cache - A sharded in-memory response cache
//!
//! Caches opaque values (typically decoded resolver responses) under string
//! keys with TTL expiration, per-shard LRU eviction and an optional
//! background cleaner. The cache never performs I/O and never populates
//! itself; callers decide what to store and for how long.

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod tasks;

pub use cache::{CacheStats, Cached, Entry, ShardedCache};
pub use config::Config;
pub use context::{CancelHandle, Context};
pub use error::{CacheError, Result};
