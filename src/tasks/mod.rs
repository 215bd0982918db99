//! Background Tasks Module
//!
//! Contains background tasks owned by a cache instance.
//!
//! # Tasks
//! - Cleaner: Sweeps every shard for expired entries at a fixed interval

mod cleaner;

pub use cleaner::{Cleaner, CleanerState};
pub(crate) use cleaner::sweep;
