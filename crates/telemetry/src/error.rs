//! Telemetry store error types.

use thiserror::Error;

/// Telemetry store operation errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("malformed record key: {0}")]
    MalformedKey(String),

    #[error("telemetry store at capacity ({current}/{max}), dropping record")]
    AtCapacity { current: usize, max: u32 },
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = std::result::Result<T, TelemetryError>;
