//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Enable request tracing.
    #[serde(default)]
    pub enable_tracing: bool,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    /// SECURITY: When enabled, ensure this endpoint is network-restricted
    /// to authorized Prometheus scraper IPs only at the infrastructure level.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            enable_tracing: false,
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

/// Symbol source configuration.
///
/// Sources are probed in the order they appear in the config; the first
/// source that has the artifact wins.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    /// An upstream HTTP symbol store probed with HEAD requests.
    Http {
        /// Base URL of the store, e.g. "https://symbols.example.com/v1/".
        base_url: String,
        /// Per-probe request timeout in seconds.
        #[serde(default = "default_source_timeout_secs")]
        timeout_secs: u64,
    },
    /// A symbol store on local disk, served to clients by a separate
    /// static file server.
    Filesystem {
        /// Root directory of the store.
        path: PathBuf,
        /// Public URL prefix clients are redirected to,
        /// e.g. "https://static.example.com/symbols/".
        public_base_url: String,
    },
}

fn default_source_timeout_secs() -> u64 {
    10
}

impl SourceConfig {
    /// Validate a single source entry.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            SourceConfig::Http { base_url, .. } => {
                if base_url.is_empty() {
                    return Err("symbols.sources: http source requires a base_url".to_string());
                }
                Ok(())
            }
            SourceConfig::Filesystem {
                public_base_url, ..
            } => {
                if public_base_url.is_empty() {
                    return Err(
                        "symbols.sources: filesystem source requires a public_base_url"
                            .to_string(),
                    );
                }
                Ok(())
            }
        }
    }
}

/// Symbol lookup configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SymbolsConfig {
    /// Symbol sources, probed in order.
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    /// Time-to-live in seconds for cached probe outcomes (default: 60).
    /// Both hits and misses are cached; a miss cached here delays
    /// clients seeing a freshly uploaded symbol by at most this long.
    #[serde(default = "default_probe_cache_ttl_secs")]
    pub probe_cache_ttl_secs: u64,
    /// Maximum number of cached probe outcomes (default: 100000).
    #[serde(default = "default_probe_cache_capacity")]
    pub probe_cache_capacity: u64,
}

fn default_probe_cache_ttl_secs() -> u64 {
    60
}

fn default_probe_cache_capacity() -> u64 {
    100_000
}

impl Default for SymbolsConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            probe_cache_ttl_secs: default_probe_cache_ttl_secs(),
            probe_cache_capacity: default_probe_cache_capacity(),
        }
    }
}

impl SymbolsConfig {
    /// Get the probe cache TTL as a Duration.
    pub fn probe_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.probe_cache_ttl_secs)
    }

    /// Validate symbol lookup configuration.
    /// Returns warnings for configs that are allowed but probably unintended,
    /// and errors for configs that are unsafe and should be rejected.
    pub fn validate(&self) -> Result<Vec<String>, String> {
        let mut warnings = Vec::new();

        if self.probe_cache_ttl_secs == 0 {
            return Err("symbols.probe_cache_ttl_secs cannot be 0. \
                 Set symbols.probe_cache_capacity = 0 to disable probe caching instead."
                .to_string());
        }

        for source in &self.sources {
            source.validate()?;
        }

        if self.sources.is_empty() {
            warnings.push(
                "symbols.sources is empty: every lookup will miss. \
                 Configure at least one http or filesystem source."
                    .to_string(),
            );
        }

        if self.probe_cache_capacity == 0 {
            warnings.push(
                "symbols.probe_cache_capacity=0 disables probe caching. \
                 Every request will hit the upstream sources."
                    .to_string(),
            );
        }

        Ok(warnings)
    }
}

/// Missing-symbol telemetry configuration.
///
/// Records are kept for two calendar days from first write, which is just
/// long enough to export yesterday's closed window. That retention is fixed;
/// only capacity and sweep cadence are tunable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Enable missing-symbol telemetry (default: true).
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,
    /// Maximum number of live records before new writes are dropped
    /// (default: 1000000). Prevents memory exhaustion from request floods
    /// with unique symbol names.
    #[serde(default = "default_max_records")]
    pub max_records: u32,
    /// Interval in seconds between sweeps of expired records (default: 300).
    #[serde(default = "default_telemetry_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

fn default_telemetry_enabled() -> bool {
    true
}

fn default_max_records() -> u32 {
    1_000_000
}

fn default_telemetry_cleanup_interval_secs() -> u64 {
    300
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            max_records: default_max_records(),
            cleanup_interval_secs: default_telemetry_cleanup_interval_secs(),
        }
    }
}

impl TelemetryConfig {
    /// Get the cleanup interval as a Duration.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    /// Validate telemetry configuration.
    /// Returns warnings for configs that are risky but allowed,
    /// and errors for configs that are unsafe and should be rejected.
    pub fn validate(&self) -> Result<Vec<String>, String> {
        let mut warnings = Vec::new();

        if !self.enabled {
            return Ok(warnings);
        }

        // Zero would panic when creating the cleanup timer
        if self.cleanup_interval_secs == 0 {
            return Err("telemetry.cleanup_interval_secs cannot be 0. \
                 Use a value >= 1 second."
                .to_string());
        }

        if self.max_records == 0 {
            return Err(
                "telemetry.max_records cannot be 0. Set telemetry.enabled = false \
                 to turn telemetry off instead."
                    .to_string(),
            );
        }

        if self.max_records < 10_000 {
            warnings.push(format!(
                "telemetry.max_records={} is very small. \
                 The daily missing-symbol report will truncate under normal \
                 production traffic. Recommended minimum: 10000.",
                self.max_records
            ));
        }

        Ok(warnings)
    }
}

/// Fetch dispatcher configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DispatcherConfig {
    /// Log each dispatch and do nothing else. Useful for rollout,
    /// when no fetch worker is deployed yet.
    #[default]
    Log,
    /// POST each dispatch to an external fetch worker.
    Webhook {
        /// Endpoint URL of the fetch worker.
        url: String,
        /// Request timeout in seconds.
        #[serde(default = "default_webhook_timeout_secs")]
        timeout_secs: u64,
    },
}

fn default_webhook_timeout_secs() -> u64 {
    5
}

/// Dedup trigger cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Time-to-live in seconds for trigger entries (default: 120).
    /// Within this window, at most one fetch is dispatched per
    /// (symbol, debugid) pair.
    #[serde(default = "default_trigger_ttl_secs")]
    pub ttl_secs: u64,
    /// Maximum number of tracked pairs before the entry nearest to expiry
    /// is evicted to make room (default: 100000).
    #[serde(default = "default_trigger_max_entries")]
    pub max_entries: u32,
    /// Interval in seconds between cleanup sweeps of expired entries
    /// (default: 60).
    #[serde(default = "default_trigger_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

fn default_trigger_ttl_secs() -> u64 {
    120
}

fn default_trigger_max_entries() -> u32 {
    100_000
}

fn default_trigger_cleanup_interval_secs() -> u64 {
    60
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_trigger_ttl_secs(),
            max_entries: default_trigger_max_entries(),
            cleanup_interval_secs: default_trigger_cleanup_interval_secs(),
        }
    }
}

impl TriggerConfig {
    /// Get the entry TTL as a Duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Get the cleanup interval as a Duration.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

/// Fetch-on-miss configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Enable background fetch dispatch for eligible misses (default: false).
    #[serde(default)]
    pub enabled: bool,
    /// Where dispatches go.
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    /// Dedup window configuration.
    #[serde(default)]
    pub trigger: TriggerConfig,
}

impl FetchConfig {
    /// Validate fetch configuration.
    /// Returns warnings for configs that are risky but allowed,
    /// and errors for configs that are unsafe and should be rejected.
    pub fn validate(&self) -> Result<Vec<String>, String> {
        let mut warnings = Vec::new();

        if !self.enabled {
            return Ok(warnings);
        }

        // Zero would panic when creating the cleanup timer
        if self.trigger.cleanup_interval_secs == 0 {
            return Err("fetch.trigger.cleanup_interval_secs cannot be 0. \
                 Use a value >= 1 second."
                .to_string());
        }

        if self.trigger.ttl_secs == 0 {
            return Err("fetch.trigger.ttl_secs cannot be 0. \
                 Entries would expire on creation and every miss would dispatch. \
                 Set fetch.enabled = false to turn dispatch off instead."
                .to_string());
        }

        if self.trigger.max_entries == 0 {
            return Err("fetch.trigger.max_entries cannot be 0. \
                 Use a value >= 1."
                .to_string());
        }

        if self.trigger.ttl_secs > 86_400 {
            warnings.push(format!(
                "fetch.trigger.ttl_secs={} is longer than a day. \
                 A failed background fetch will not be retried until the \
                 window expires. Recommended: 60-600 seconds.",
                self.trigger.ttl_secs
            ));
        }

        if let DispatcherConfig::Webhook { url, .. } = &self.dispatcher
            && url.is_empty()
        {
            return Err("fetch.dispatcher: webhook dispatcher requires a url".to_string());
        }

        Ok(warnings)
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Symbol lookup configuration.
    #[serde(default)]
    pub symbols: SymbolsConfig,
    /// Missing-symbol telemetry configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Fetch-on-miss configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** No sources, telemetry on, fetch dispatch off.
    pub fn for_testing() -> Self {
        Self::default()
    }
}
