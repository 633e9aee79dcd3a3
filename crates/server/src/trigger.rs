//! Fetch trigger deduplication.
//!
//! Misses for the same symbol arrive in bursts while a crash is being
//! processed, and every one of them is a candidate for a background fetch.
//! The trigger cache grants one dispatch per symbol/debugid within a TTL
//! window and suppresses the rest.
//!
//! # Memory Safety
//!
//! The window map is bounded:
//! - Configurable maximum entries (default: 100,000)
//! - At capacity, the entry closest to expiry is evicted to admit a new key
//! - Background cleanup task that removes expired windows periodically

use crate::metrics::TRIGGER_EVICTIONS;
use dashmap::{DashMap, mapref::entry::Entry};
use quarry_core::config::TriggerConfig;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

/// Deduplication window for background fetch dispatches.
///
/// Each key maps to the instant its window expires. A key whose window has
/// not yet expired already has a dispatch in flight (or recently completed),
/// so further acquisitions for it are refused until the window lapses.
pub struct TriggerCache {
    windows: DashMap<String, Instant>,
    ttl: Duration,
    max_entries: u32,
    at_capacity_warned: AtomicBool,
}

impl TriggerCache {
    /// Create a trigger cache from configuration.
    pub fn new(config: &TriggerConfig) -> Self {
        Self {
            windows: DashMap::new(),
            ttl: config.ttl(),
            max_entries: config.max_entries,
            at_capacity_warned: AtomicBool::new(false),
        }
    }

    /// Try to open a dispatch window for `key`.
    ///
    /// Returns `true` if the caller won the window and should dispatch a
    /// fetch, `false` if a window for this key is still live.
    pub fn try_acquire(&self, key: &str) -> bool {
        let now = Instant::now();

        // DashMap's len() can deadlock if called while holding an entry lock,
        // so the capacity check happens before entry(). The check is racy,
        // but the cap only needs to hold approximately.
        let current = self.windows.len();
        if current >= self.max_entries as usize && !self.windows.contains_key(key) {
            self.warn_at_capacity(current);
            if self.evict_soonest().is_some() {
                TRIGGER_EVICTIONS.inc();
            }
        }

        match self.windows.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if *occupied.get() > now {
                    false
                } else {
                    occupied.insert(now + self.ttl);
                    true
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(now + self.ttl);
                true
            }
        }
    }

    /// Remove expired windows. Returns the number of entries removed.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();

        let stale: Vec<String> = self
            .windows
            .iter()
            .filter(|entry| *entry.value() <= now)
            .map(|entry| entry.key().clone())
            .collect();

        let mut evicted = 0;
        for key in stale {
            // Atomically remove only if the window is still expired; it may
            // have been re-armed between collection and removal.
            if self
                .windows
                .remove_if(&key, |_, expires_at| *expires_at <= now)
                .is_some()
            {
                evicted += 1;
            }
        }

        if evicted > 0 {
            // Reset the at-capacity warning so it can fire again if we fill up
            self.at_capacity_warned.store(false, Ordering::Relaxed);
        }

        evicted
    }

    /// Current number of tracked windows, live and expired.
    pub fn entry_count(&self) -> usize {
        self.windows.len()
    }

    /// Evict the window closest to expiry to admit a new key.
    fn evict_soonest(&self) -> Option<String> {
        // Clone out (key, expiry) pairs one at a time so no shard guard is
        // held while picking the minimum or removing.
        let (victim, _) = self
            .windows
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .min_by_key(|(_, expires_at)| *expires_at)?;
        self.windows.remove(&victim);
        Some(victim)
    }

    /// Log a warning when the cache is at capacity (only once per capacity event).
    /// This prevents log spam when a miss storm pushes thousands of new keys
    /// through the cache per second.
    fn warn_at_capacity(&self, current_entries: usize) {
        if !self.at_capacity_warned.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                current_entries = current_entries,
                max_entries = self.max_entries,
                "Fetch trigger cache at capacity, evicting windows closest to expiry. \
                 This warning is logged once per capacity event to prevent log spam."
            );
        }
    }
}

/// Spawn a background task that periodically removes expired trigger windows.
/// Returns a handle that can be used to stop the cleanup task.
pub fn spawn_cleanup_task(
    cache: Arc<TriggerCache>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let evicted = cache.cleanup();
            if evicted > 0 {
                tracing::debug!(
                    evicted = evicted,
                    "Trigger cleanup task removed expired windows"
                );
            }
        }
    })
}
