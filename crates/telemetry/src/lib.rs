//! Missing-symbol telemetry for Quarry.
//!
//! This crate records demand for symbols that could not be resolved:
//! - Composite day-partitioned record keys and their split/join rules
//! - A bounded, concurrent counter store with fixed two-day retention
//! - Windowed export of one day's distinct references

pub mod error;
pub mod key;
pub mod store;

pub use error::{TelemetryError, TelemetryResult};
pub use key::MissingSymbol;
pub use store::{DayReport, MissingSymbolStore, RECORD_TTL, spawn_cleanup_task};
