//! Configuration Module
//!
//! Handles loading cache sizing and sweep settings from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of independently locked shards
    pub shard_count: usize,
    /// Maximum number of entries per shard
    pub shard_capacity: usize,
    /// Interval between background sweeps, zero disables the cleaner
    pub cleaner_interval: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_SHARDS` - Number of shards (default: 64)
    /// - `CACHE_SHARD_CAPACITY` - Entries per shard (default: 1024)
    /// - `CACHE_CLEANER_INTERVAL_MS` - Sweep interval in milliseconds, 0 disables (default: 60000)
    ///
    /// Unparseable values fall back to their defaults. The result is validated.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            shard_count: parse_var("CACHE_SHARDS").unwrap_or(defaults.shard_count),
            shard_capacity: parse_var("CACHE_SHARD_CAPACITY").unwrap_or(defaults.shard_capacity),
            cleaner_interval: parse_var("CACHE_CLEANER_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.cleaner_interval),
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the cache cannot route with.
    pub fn validate(&self) -> Result<()> {
        if self.shard_count == 0 {
            return Err(CacheError::InvalidConfig(
                "shard_count must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Upper bound on the total number of entries.
    pub fn max_entries(&self) -> usize {
        self.shard_count.saturating_mul(self.shard_capacity)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shard_count: 64,
            shard_capacity: 1024,
            cleaner_interval: Duration::from_secs(60),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
