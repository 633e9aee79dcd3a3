//! Symbol download endpoint (read path).
//!
//! The download path never serves artifact bytes. A hit redirects the client
//! to the public URL of whichever source has the artifact; a miss is recorded
//! as telemetry and, when eligible, kicks off a background fetch.

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use quarry_core::SymbolRef;
use quarry_core::config::FetchConfig;
use quarry_core::ignore::should_ignore;
use quarry_telemetry::TelemetryError;
use serde::Deserialize;
use std::time::Instant;
use time::OffsetDateTime;

/// Response header carrying the lookup time in seconds, sent when the
/// request asks for it via the `Debug` header.
pub const DEBUG_TIME_HEADER: &str = "debug-time";

const MISSING_BODY: &str = "Symbol Not Found";
const MISSING_SOON_BODY: &str = "Symbol Not Found Yet";
const IGNORED_BODY: &str = "Symbol Not Found (and ignored)";

/// Query parameters accepted by the download endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    /// Auxiliary code file, recorded with misses.
    code_file: Option<String>,
    /// Auxiliary code id, recorded with misses.
    code_id: Option<String>,
}

/// GET|HEAD /{symbol}/{debugid}/{filename} - Resolve a symbol request.
///
/// A GET hit answers 302 with the upstream URL in `Location`; a HEAD hit
/// answers an empty 200. Misses answer 404 with a plain-text body, and a GET
/// miss additionally feeds telemetry and the fetch pipeline.
pub async fn download_symbol(
    State(state): State<AppState>,
    method: Method,
    Path((symbol, debugid, filename)): Path<(String, String, String)>,
    Query(query): Query<DownloadQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let started = Instant::now();
    let reference = SymbolRef::new(symbol, debugid, filename)
        .with_code_info(query.code_file.as_deref(), query.code_id.as_deref());
    let debug_timing = wants_debug_timing(&headers);

    let response = download_internal(&state, method, reference, debug_timing).await?;
    metrics::DOWNLOAD_DURATION.observe(started.elapsed().as_secs_f64());
    Ok(response)
}

/// Internal download handler.
async fn download_internal(
    state: &AppState,
    method: Method,
    reference: SymbolRef,
    debug_timing: bool,
) -> ApiResult<Response> {
    if should_ignore(&reference) {
        tracing::debug!(reference = %reference, "Ignoring symbol");
        metrics::DOWNLOADS_IGNORED.inc();
        // Nothing was looked up, so the reported time is a literal zero.
        return Ok(plain_not_found(IGNORED_BODY, debug_timing.then_some(0.0)));
    }

    let resolution = state.lookup.resolve(&reference).await;
    // The header reports lookup time, not total request time, so that a slow
    // upstream probe is distinguishable from a slow response path.
    let debug_time = debug_timing.then(|| resolution.elapsed.as_secs_f64());

    if let Some(url) = resolution.url {
        metrics::DOWNLOADS_FOUND.inc();
        return found_response(&method, &url, debug_time);
    }

    metrics::DOWNLOADS_MISSING.inc();

    // HEAD misses are probes, not demand; they feed neither telemetry nor
    // the fetch pipeline.
    if method == Method::HEAD {
        return Ok(plain_not_found(MISSING_BODY, debug_time));
    }

    record_telemetry(state, &reference);

    if is_fetch_eligible(&state.config.fetch, &reference) {
        dispatch_fetch(state, &reference);
        // The artifact may land at any moment now; the cached miss must not
        // outlive this response.
        state.lookup.invalidate(&reference).await;
        return Ok(plain_not_found(MISSING_SOON_BODY, debug_time));
    }

    Ok(plain_not_found(MISSING_BODY, debug_time))
}

/// Whether the client asked for lookup timing via the `Debug` header.
fn wants_debug_timing(headers: &HeaderMap) -> bool {
    headers
        .get("debug")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            ["1", "true", "yes"].contains(&value.to_lowercase().as_str())
        })
}

/// A miss is eligible for a background fetch when dispatch is enabled and the
/// request asks for the Breakpad rendition of a PDB debug file.
fn is_fetch_eligible(config: &FetchConfig, reference: &SymbolRef) -> bool {
    config.enabled
        && reference.symbol.to_lowercase().ends_with(".pdb")
        && reference.filename.to_lowercase().ends_with(".sym")
}

/// Record a GET miss, degrading to a metric and log line when the store
/// refuses the write.
fn record_telemetry(state: &AppState, reference: &SymbolRef) {
    let Some(telemetry) = &state.telemetry else {
        return;
    };

    match telemetry.record_miss(reference, OffsetDateTime::now_utc()) {
        Ok(()) => metrics::MISSES_RECORDED.inc(),
        Err(err @ TelemetryError::MalformedKey(_)) => {
            metrics::record_telemetry_drop("malformed_key");
            tracing::warn!(reference = %reference, error = %err, "Dropping unrecordable miss");
        }
        Err(TelemetryError::AtCapacity { .. }) => {
            // The store logs the capacity event itself; logging per request
            // here would flood during a miss storm.
            metrics::record_telemetry_drop("at_capacity");
        }
    }
}

/// Dispatch a background fetch unless one already went out for this symbol
/// within the trigger window.
fn dispatch_fetch(state: &AppState, reference: &SymbolRef) {
    let key = format!("{}/{}", reference.symbol, reference.debugid);
    if !state.trigger.try_acquire(&key) {
        metrics::FETCH_SUPPRESSED.inc();
        tracing::debug!(key = %key, "Fetch already dispatched within the trigger window");
        return;
    }

    metrics::FETCH_DISPATCHES.inc();
    let dispatcher = state.dispatcher.clone();
    let symbol = reference.symbol.clone();
    let debugid = reference.debugid.clone();
    tokio::spawn(async move {
        if let Err(err) = dispatcher.dispatch(&symbol, &debugid).await {
            metrics::FETCH_DISPATCH_FAILURES.inc();
            tracing::warn!(
                dispatcher = dispatcher.name(),
                symbol = %symbol,
                debugid = %debugid,
                error = %err,
                "Background fetch dispatch failed"
            );
        }
    });
}

/// Build the response for a resolved reference.
fn found_response(method: &Method, url: &str, debug_time: Option<f64>) -> ApiResult<Response> {
    let mut headers = HeaderMap::new();
    insert_debug_time(&mut headers, debug_time);

    // HEAD only asks whether the artifact exists; no redirect is sent.
    if *method == Method::HEAD {
        return Ok((StatusCode::OK, headers).into_response());
    }

    let location = HeaderValue::from_str(url).map_err(|_| {
        ApiError::Internal(format!("resolved URL {url:?} is not a valid Location header"))
    })?;
    headers.insert(LOCATION, location);
    Ok((StatusCode::FOUND, headers).into_response())
}

/// Build a plain-text miss response.
fn plain_not_found(body: &'static str, debug_time: Option<f64>) -> Response {
    let mut headers = HeaderMap::new();
    insert_debug_time(&mut headers, debug_time);
    (StatusCode::NOT_FOUND, headers, body).into_response()
}

fn insert_debug_time(headers: &mut HeaderMap, debug_time: Option<f64>) {
    if let Some(seconds) = debug_time
        && let Ok(value) = HeaderValue::from_str(&seconds.to_string())
    {
        headers.insert(DEBUG_TIME_HEADER, value);
    }
}
