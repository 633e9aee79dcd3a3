//! Day-partitioned missing-symbol counter store.
//!
//! Every failed lookup from every client lands here, so writes must stay
//! cheap and uncontended. Records live in a sharded concurrent map keyed by
//! the composite day key; increment-or-create is a single atomic entry
//! operation and no lock is ever held across I/O.
//!
//! # Memory Safety
//!
//! The store is bounded:
//! - Configurable maximum record count (default: 1,000,000); new keys are
//!   dropped at capacity
//! - Records expire a fixed two days after first write
//! - A background cleanup task sweeps expired records periodically

use crate::error::{TelemetryError, TelemetryResult};
use crate::key::{self, MissingSymbol};
use dashmap::{DashMap, mapref::entry::Entry};
use quarry_core::SymbolRef;
use quarry_core::config::TelemetryConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use time::{Date, OffsetDateTime};

/// How long a record stays live after first write. Two days is just enough
/// that yesterday's closed window can always be exported; increments never
/// extend it.
pub const RECORD_TTL: Duration = Duration::from_secs(2 * 24 * 60 * 60);

/// A single counter record.
struct Record {
    count: u64,
    expires_at: Instant,
}

impl Record {
    fn fresh(now: Instant) -> Self {
        Self {
            count: 1,
            expires_at: now + RECORD_TTL,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// Result of exporting one day's records.
#[derive(Debug)]
pub struct DayReport {
    /// Distinct references recorded that day, in no particular order.
    pub rows: Vec<MissingSymbol>,
    /// Stored keys that failed to split back into fields. Always zero
    /// unless the key format changed underneath a live store.
    pub skipped: usize,
}

/// Shared counting store for missing-symbol demand.
///
/// Counts are an approximate demand signal, not billing-grade: a record
/// dropped at capacity or an increment lost to expiry is an accepted
/// degradation.
pub struct MissingSymbolStore {
    records: DashMap<String, Record>,
    max_records: u32,
    /// Whether the at-capacity warning has been logged (prevents log spam
    /// during request floods).
    at_capacity_warned: AtomicBool,
}

impl MissingSymbolStore {
    /// Create a new store from configuration.
    pub fn new(config: &TelemetryConfig) -> Self {
        Self {
            records: DashMap::new(),
            max_records: config.max_records,
            at_capacity_warned: AtomicBool::new(false),
        }
    }

    /// Record one failed lookup at the given time.
    ///
    /// The first write for a (day, reference) pair creates the record with
    /// count 1 and a fixed two-day expiration; later writes increment the
    /// count without touching the expiration.
    pub fn record_miss(
        &self,
        reference: &SymbolRef,
        timestamp: OffsetDateTime,
    ) -> TelemetryResult<()> {
        let key = key::build(timestamp.date(), reference)?;
        let now = Instant::now();

        // Check capacity before acquiring the entry lock to avoid deadlock.
        // DashMap's len() can deadlock if called while holding an entry lock.
        // The check is slightly racy; at worst a handful of concurrent
        // writers overshoot max_records briefly.
        let current_len = self.records.len();
        let at_capacity = current_len >= self.max_records as usize;

        match self.records.entry(key) {
            Entry::Occupied(mut entry) => {
                let record = entry.get_mut();
                if record.is_expired(now) {
                    // Expired but not yet swept: same as a fresh create
                    *record = Record::fresh(now);
                } else {
                    record.count += 1;
                }
            }
            Entry::Vacant(entry) => {
                if at_capacity {
                    self.warn_at_capacity(current_len);
                    return Err(TelemetryError::AtCapacity {
                        current: current_len,
                        max: self.max_records,
                    });
                }
                entry.insert(Record::fresh(now));
            }
        }

        Ok(())
    }

    /// Current live count for a (day, reference) pair.
    pub fn count_for(&self, day: Date, reference: &SymbolRef) -> Option<u64> {
        let key = key::build(day, reference).ok()?;
        let record = self.records.get(&key)?;
        (!record.is_expired(Instant::now())).then_some(record.count)
    }

    /// Number of records currently held, expired-but-unswept included.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Export every live record of one day.
    ///
    /// The result is a snapshot; writes racing the export may or may not be
    /// included. Keys that fail to split are skipped and counted rather
    /// than aborting the export.
    pub fn export_day(&self, day: Date) -> DayReport {
        let prefix = key::day_prefix(day);
        let now = Instant::now();
        let mut rows = Vec::new();
        let mut skipped = 0;

        for entry in self.records.iter() {
            if !entry.key().starts_with(&prefix) || entry.value().is_expired(now) {
                continue;
            }
            match key::split(entry.key()) {
                Ok(row) => rows.push(row),
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(key = entry.key(), error = %err, "skipping unsplittable record key");
                }
            }
        }

        DayReport { rows, skipped }
    }

    /// Sweep expired records. Returns the number of records evicted.
    ///
    /// Uses atomic `remove_if` so a record recreated between collection and
    /// removal survives.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let stale: Vec<String> = self
            .records
            .iter()
            .filter(|entry| entry.value().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();

        let mut evicted = 0;
        for key in stale {
            if self
                .records
                .remove_if(&key, |_, record| record.is_expired(now))
                .is_some()
            {
                evicted += 1;
            }
        }

        if evicted > 0 {
            // Room again, so the warning may fire on the next capacity event
            self.at_capacity_warned.store(false, Ordering::Relaxed);
            tracing::debug!(
                evicted = evicted,
                remaining = self.records.len(),
                "telemetry store cleanup completed"
            );
        }

        evicted
    }

    /// Log the at-capacity warning once per capacity event.
    fn warn_at_capacity(&self, current_records: usize) {
        if !self.at_capacity_warned.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                current_records = current_records,
                max_records = self.max_records,
                "Telemetry store at capacity, dropping new missing-symbol records. \
                 This warning is logged once per capacity event to prevent log spam."
            );
        }
    }
}

/// Spawn a background task that periodically sweeps expired records.
pub fn spawn_cleanup_task(
    store: Arc<MissingSymbolStore>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let evicted = store.cleanup();
            if evicted > 0 {
                tracing::info!(
                    evicted = evicted,
                    "Telemetry cleanup task evicted expired records"
                );
            }
        }
    })
}
