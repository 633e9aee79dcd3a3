//! Route configuration.

use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Health check (intentionally unauthenticated for load balancers/k8s probes)
        .route("/v1/health", get(handlers::health))
        // Daily missing-symbol report
        .route("/missingsymbols.csv", get(handlers::missing_symbols_csv));

    // get() also answers HEAD requests; the handler distinguishes by method.
    // Static paths always match ahead of this three-segment capture route.
    let download_routes = Router::new().route(
        "/{symbol}/{debugid}/{filename}",
        get(handlers::download_symbol),
    );

    let mut router = Router::new().merge(api_routes).merge(download_routes);

    // Conditionally add metrics endpoint based on config.
    // SECURITY: When enabled, this endpoint MUST be network-restricted
    // to authorized Prometheus scraper IPs only.
    // See crate::metrics module documentation for details.
    if state.config.server.metrics_enabled {
        let metrics_routes = Router::new().route("/metrics", get(metrics_handler));
        router = router.merge(metrics_routes);
    }

    if state.config.server.enable_tracing {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}
