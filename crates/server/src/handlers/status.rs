//! Service status endpoints.

use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::Serialize;

/// Health of one configured symbol source.
#[derive(Debug, Serialize)]
pub struct SourceHealth {
    /// Source name as it appears in logs.
    pub name: String,
    /// Whether the reachability probe succeeded.
    pub healthy: bool,
    /// Probe error, present only when unhealthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Service health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when any source fails its probe.
    pub status: &'static str,
    /// Server version.
    pub version: &'static str,
    /// Per-source reachability, in configuration order.
    pub sources: Vec<SourceHealth>,
}

/// GET /v1/health - Service health and per-source reachability.
///
/// Always answers 200; sources fail open, so an unreachable source degrades
/// the service rather than taking it down.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let mut sources = Vec::new();
    let mut degraded = false;

    for (name, result) in state.lookup.health_check().await {
        match result {
            Ok(()) => sources.push(SourceHealth {
                name,
                healthy: true,
                error: None,
            }),
            Err(err) => {
                degraded = true;
                sources.push(SourceHealth {
                    name,
                    healthy: false,
                    error: Some(err.to_string()),
                });
            }
        }
    }

    Json(HealthResponse {
        status: if degraded { "degraded" } else { "ok" },
        version: env!("CARGO_PKG_VERSION"),
        sources,
    })
}
