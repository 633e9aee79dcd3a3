//! Application state shared across handlers.

use crate::dispatch::FetchDispatcher;
use crate::trigger::TriggerCache;
use quarry_core::config::AppConfig;
use quarry_symbols::SymbolLookup;
use quarry_telemetry::MissingSymbolStore;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Symbol lookup over the configured sources.
    pub lookup: Arc<SymbolLookup>,
    /// Missing-symbol telemetry store (None when telemetry is disabled).
    pub telemetry: Option<Arc<MissingSymbolStore>>,
    /// Dedup windows for background fetch dispatch.
    pub trigger: Arc<TriggerCache>,
    /// Background fetch dispatcher.
    pub dispatcher: Arc<dyn FetchDispatcher>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// This performs configuration validation and logs warnings for potentially
    /// dangerous settings. Panics if configuration is invalid.
    ///
    /// # Panics
    ///
    /// Panics if telemetry or fetch configuration validation fails with an error.
    pub fn new(
        config: AppConfig,
        lookup: Arc<SymbolLookup>,
        dispatcher: Arc<dyn FetchDispatcher>,
    ) -> Self {
        // Validate telemetry configuration - fail fast on errors, log warnings
        match config.telemetry.validate() {
            Ok(warnings) => {
                for warning in warnings {
                    tracing::warn!("Configuration warning: {}", warning);
                }
            }
            Err(error) => {
                panic!("Invalid telemetry configuration: {}", error);
            }
        }

        // Validate fetch configuration - fail fast on errors, log warnings
        match config.fetch.validate() {
            Ok(warnings) => {
                for warning in warnings {
                    tracing::warn!("Configuration warning: {}", warning);
                }
            }
            Err(error) => {
                panic!("Invalid fetch configuration: {}", error);
            }
        }

        let telemetry = config
            .telemetry
            .enabled
            .then(|| Arc::new(MissingSymbolStore::new(&config.telemetry)));
        let trigger = Arc::new(TriggerCache::new(&config.fetch.trigger));

        Self {
            config: Arc::new(config),
            lookup,
            telemetry,
            trigger,
            dispatcher,
        }
    }

    /// Get the cleanup interval for the trigger cache, if fetch dispatch is enabled.
    /// Returns None if fetch dispatch is disabled.
    /// Returns a default of 60 seconds if cleanup interval is configured as zero
    /// (to prevent tokio::time::interval from panicking).
    pub fn trigger_cleanup_interval(&self) -> Option<Duration> {
        if self.config.fetch.enabled {
            let interval_secs = self.config.fetch.trigger.cleanup_interval_secs;
            // Guard against zero interval which would cause tokio::time::interval to panic
            if interval_secs == 0 {
                tracing::warn!(
                    "fetch.trigger.cleanup_interval_secs is 0, using default of 60 seconds"
                );
                Some(Duration::from_secs(60))
            } else {
                Some(Duration::from_secs(interval_secs))
            }
        } else {
            None
        }
    }

    /// Get the cleanup interval for expired telemetry records, if telemetry is enabled.
    /// Returns None if telemetry is disabled.
    /// Returns a default of 60 seconds if cleanup interval is configured as zero
    /// (to prevent tokio::time::interval from panicking).
    pub fn telemetry_cleanup_interval(&self) -> Option<Duration> {
        if self.telemetry.is_some() {
            let interval_secs = self.config.telemetry.cleanup_interval_secs;
            // Guard against zero interval which would cause tokio::time::interval to panic
            if interval_secs == 0 {
                tracing::warn!("telemetry.cleanup_interval_secs is 0, using default of 60 seconds");
                Some(Duration::from_secs(60))
            } else {
                Some(Duration::from_secs(interval_secs))
            }
        } else {
            None
        }
    }
}
