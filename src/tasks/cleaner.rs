//! TTL Cleaner Task
//!
//! Background task that periodically sweeps every shard for expired entries,
//! so keys that are never read again do not linger until evicted.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cache::Shard;

// == Cleaner State ==
/// Lifecycle of a spawned cleaner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanerState {
    /// Ticking in the background
    Running,
    /// The task has exited; terminal
    Stopped,
}

// == Cleaner ==
/// Handle to the background sweep task of one cache.
///
/// The task lives until [`Cleaner::stop`] is awaited or the handle is
/// dropped; dropping it signals the task without waiting for it.
#[derive(Debug)]
pub struct Cleaner {
    interval: Duration,
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Cleaner {
    /// Spawns a task that removes expired entries from `shards` every
    /// `interval`.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime, or if `interval` is zero.
    pub fn spawn<V>(shards: Arc<[Shard<V>]>, interval: Duration) -> Self
    where
        V: Send + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            info!(
                "Starting cache cleaner with interval of {:?} over {} shards",
                interval,
                shards.len()
            );

            // first sweep one full interval after start
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    // fires on an explicit stop and when the sender is dropped
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let removed = sweep(&shards, Instant::now());
                        if removed > 0 {
                            debug!("Cache cleaner: removed {} expired entries", removed);
                        }
                    }
                }
            }

            info!("Cache cleaner stopped");
        });

        Self {
            interval,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> CleanerState {
        match &self.handle {
            Some(handle) if !handle.is_finished() => CleanerState::Running,
            _ => CleanerState::Stopped,
        }
    }

    // == Stop ==
    /// Signals the task to stop and waits until it has exited.
    ///
    /// Calling it again after the task has stopped is a no-op.
    pub async fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // the task may already be gone; the join below still settles it
            let _ = stop_tx.send(());
        }

        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                warn!("Cache cleaner exited abnormally: {}", err);
            }
        }
    }
}

impl Drop for Cleaner {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
    }
}

/// Removes every entry expired as of `now` from each shard in turn.
///
/// Returns the total number of entries removed.
pub(crate) fn sweep<V>(shards: &[Shard<V>], now: Instant) -> usize {
    shards.iter().map(|shard| shard.clean_expired(now)).sum()
}
