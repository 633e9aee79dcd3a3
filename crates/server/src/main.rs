//! Quarry server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use quarry_core::config::AppConfig;
use quarry_server::{AppState, create_router};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Quarry - A crash symbolication symbol server
#[derive(Parser, Debug)]
#[command(name = "quarryd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "QUARRY_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Startup banner
    tracing::info!("Quarry v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (file is optional, env vars can provide/override everything)
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    let has_config_file = config_path.exists();

    if has_config_file {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    // Check for QUARRY_ environment variables (excluding QUARRY_CONFIG which is just the path)
    let has_env_config =
        std::env::vars().any(|(key, _)| key.starts_with("QUARRY_") && key != "QUARRY_CONFIG");

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: quarryd --config /path/to/config.toml\n  \
             2. Environment variables: QUARRY_SERVER__BIND=0.0.0.0:8080 \
             QUARRY_TELEMETRY__ENABLED=true quarryd\n\n\
             See config/server.example.toml for example configuration.\n\
             Set QUARRY_CONFIG env var to specify a default config file path."
        );
    }

    if !has_config_file {
        tracing::info!("Using environment variables for configuration");
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("QUARRY_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    // Register Prometheus metrics
    quarry_server::metrics::register_metrics();
    tracing::info!("Prometheus metrics registered");

    // Initialize symbol sources
    let lookup = Arc::new(
        quarry_symbols::from_config(&config.symbols)
            .context("failed to initialize symbol sources")?,
    );
    tracing::info!(sources = lookup.source_count(), "Symbol sources initialized");

    // Probe source reachability before accepting requests. Sources fail open
    // during lookups, so an unreachable source degrades service instead of
    // blocking startup.
    for (name, result) in lookup.health_check().await {
        match result {
            Ok(()) => tracing::info!(source = %name, "Symbol source reachable"),
            Err(error) => {
                tracing::warn!(source = %name, %error, "Symbol source failed startup probe")
            }
        }
    }

    // Initialize the fetch dispatcher
    let dispatcher = quarry_server::dispatch::from_config(&config.fetch.dispatcher)
        .context("failed to initialize fetch dispatcher")?;
    if config.fetch.enabled {
        tracing::info!(
            dispatcher = dispatcher.name(),
            "Background fetch dispatch enabled"
        );
    } else {
        tracing::info!("Background fetch dispatch disabled");
    }

    // Create application state
    let state = AppState::new(config.clone(), lookup, dispatcher);

    // Spawn trigger cleanup task if fetch dispatch is enabled
    if let Some(cleanup_interval) = state.trigger_cleanup_interval() {
        quarry_server::trigger::spawn_cleanup_task(state.trigger.clone(), cleanup_interval);
        tracing::info!(
            interval_secs = cleanup_interval.as_secs(),
            "Trigger cleanup task spawned"
        );
    }

    // Spawn telemetry cleanup task if telemetry is enabled
    if let Some(cleanup_interval) = state.telemetry_cleanup_interval()
        && let Some(store) = &state.telemetry
    {
        quarry_telemetry::spawn_cleanup_task(store.clone(), cleanup_interval);
        tracing::info!(
            interval_secs = cleanup_interval.as_secs(),
            "Telemetry cleanup task spawned"
        );
    }

    // Create router
    let app = create_router(state);

    // Parse bind address
    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
