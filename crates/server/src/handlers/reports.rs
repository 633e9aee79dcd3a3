//! Missing-symbol report export.

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use quarry_telemetry::{DayReport, key};
use serde::Deserialize;
use time::{Date, OffsetDateTime};

/// Query parameters for the missing-symbol report.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// Export today's still-open window instead of yesterday's closed one.
    #[serde(default)]
    today: bool,
}

/// GET /missingsymbols.csv - One day of missing-symbol telemetry as CSV.
///
/// Defaults to yesterday, the most recent closed UTC day window. With
/// `?today=true` the still-open current day is exported instead.
pub async fn missing_symbols_csv(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Response> {
    let day = report_day(OffsetDateTime::now_utc().date(), query.today);

    // With telemetry disabled the endpoint still serves the header row, so
    // report consumers keep a stable shape.
    let report = match &state.telemetry {
        Some(telemetry) => telemetry.export_day(day),
        None => DayReport {
            rows: Vec::new(),
            skipped: 0,
        },
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["debug_file", "debug_id", "code_file", "code_id"])?;
    for row in &report.rows {
        writer.write_record([&row.symbol, &row.debugid, &row.code_file, &row.code_id])?;
    }
    let body = writer
        .into_inner()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    metrics::EXPORT_ROWS.inc_by(report.rows.len() as u64);
    if report.skipped > 0 {
        metrics::EXPORT_ROWS_SKIPPED.inc_by(report.skipped as u64);
    }

    let disposition = format!(
        "attachment; filename=\"missing-symbols-{}.csv\"",
        key::format_day(day)
    );
    Ok((
        [
            (CONTENT_TYPE, "text/csv".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// The UTC day a report request refers to.
fn report_day(today: Date, include_today: bool) -> Date {
    if include_today {
        today
    } else {
        // previous_day is None only at Date::MIN
        today.previous_day().unwrap_or(today)
    }
}
