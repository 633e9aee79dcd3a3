//! HTTP API server for the Quarry symbol server.
//!
//! This crate provides the HTTP surface:
//! - Symbol download resolution (redirect on hit, 404 on miss)
//! - Missing-symbol telemetry recording on GET misses
//! - Background fetch dispatch with per-symbol dedup windows
//! - Daily missing-symbol CSV report
//! - Health and metrics endpoints

pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod trigger;

pub use dispatch::{DispatchError, FetchDispatcher, LogDispatcher, WebhookDispatcher};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
pub use trigger::TriggerCache;
