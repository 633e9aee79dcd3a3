//! Server test utilities.

use async_trait::async_trait;
use quarry_core::config::{AppConfig, SourceConfig};
use quarry_server::dispatch::{DispatchError, DispatchResult, FetchDispatcher};
use quarry_server::{AppState, create_router};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// A dispatcher that counts calls and succeeds.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct CountingDispatcher {
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl FetchDispatcher for CountingDispatcher {
    fn name(&self) -> &str {
        "counting"
    }

    async fn dispatch(&self, _symbol: &str, _debugid: &str) -> DispatchResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A dispatcher whose dispatches always come back rejected.
#[allow(dead_code)]
pub struct FailingDispatcher;

#[async_trait]
impl FetchDispatcher for FailingDispatcher {
    fn name(&self) -> &str {
        "failing"
    }

    async fn dispatch(&self, _symbol: &str, _debugid: &str) -> DispatchResult<()> {
        Err(DispatchError::Rejected { status: 503 })
    }
}

/// A test server over a temporary filesystem symbol store.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    /// Dispatches observed by the counting dispatcher.
    pub dispatches: Arc<AtomicUsize>,
    /// Root of the on-disk store backing the filesystem source.
    pub symbols_dir: PathBuf,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a test server with default config: one filesystem source,
    /// telemetry on, fetch dispatch on with a counting dispatcher.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = Arc::new(CountingDispatcher {
            calls: calls.clone(),
        });
        Self::build(modifier, dispatcher, calls).await
    }

    /// Create a test server with a specific dispatcher implementation.
    pub async fn with_dispatcher<F>(modifier: F, dispatcher: Arc<dyn FetchDispatcher>) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        Self::build(modifier, dispatcher, Arc::new(AtomicUsize::new(0))).await
    }

    async fn build<F>(
        modifier: F,
        dispatcher: Arc<dyn FetchDispatcher>,
        dispatches: Arc<AtomicUsize>,
    ) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        quarry_server::metrics::register_metrics();

        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let symbols_dir = temp_dir.path().join("symbols");
        std::fs::create_dir_all(&symbols_dir).expect("Failed to create symbol store directory");

        let mut config = AppConfig::default();
        config.symbols.sources = vec![SourceConfig::Filesystem {
            path: symbols_dir.clone(),
            public_base_url: "http://symbols.test/".to_string(),
        }];
        // On by default so miss-path tests exercise the trigger window
        config.fetch.enabled = true;

        // Apply user modifications
        modifier(&mut config);

        let lookup = Arc::new(
            quarry_symbols::from_config(&config.symbols)
                .expect("Failed to initialize symbol sources"),
        );

        let state = AppState::new(config, lookup, dispatcher);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            dispatches,
            symbols_dir,
            _temp_dir: temp_dir,
        }
    }

    /// Direct access to the telemetry store. Panics if disabled by the config
    /// modifier; tests that disable telemetry should not call this.
    pub fn telemetry(&self) -> Arc<quarry_telemetry::MissingSymbolStore> {
        self.state
            .telemetry
            .clone()
            .expect("telemetry disabled in this test server")
    }
}
