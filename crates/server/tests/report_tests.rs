//! Integration tests for the missing-symbols CSV report.

mod common;

use axum::body::Body;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use common::TestServer;
use common::fixtures::{DEBUG_ID, sym_uri};
use quarry_telemetry::key::format_day;
use time::OffsetDateTime;
use tower::ServiceExt;

const CSV_HEADER: &str = "debug_file,debug_id,code_file,code_id";

async fn get(router: &axum::Router, uri: &str) -> Response {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    router.clone().oneshot(request).await.unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_csv_defaults_to_yesterday_and_starts_empty() {
    let server = TestServer::new().await;

    let response = get(&server.router, "/missingsymbols.csv").await;
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get(CONTENT_TYPE).unwrap();
    assert_eq!(content_type.to_str().unwrap(), "text/csv");

    let today = OffsetDateTime::now_utc().date();
    let yesterday = today.previous_day().unwrap();
    let disposition = response.headers().get(CONTENT_DISPOSITION).unwrap();
    assert_eq!(
        disposition.to_str().unwrap(),
        format!(
            "attachment; filename=\"missing-symbols-{}.csv\"",
            format_day(yesterday)
        )
    );

    assert_eq!(body_text(response).await, format!("{CSV_HEADER}\n"));
}

#[tokio::test]
async fn test_csv_today_includes_fresh_records() {
    let server = TestServer::new().await;

    // Produce one recorded miss with auxiliary code info
    let miss_uri = format!(
        "{}?code_file=xul.dll&code_id=ABC123",
        sym_uri("xul.pdb", DEBUG_ID, "xul.sym")
    );
    get(&server.router, &miss_uri).await;

    let response = get(&server.router, "/missingsymbols.csv?today=true").await;
    assert_eq!(response.status(), StatusCode::OK);

    let today = OffsetDateTime::now_utc().date();
    let disposition = response.headers().get(CONTENT_DISPOSITION).unwrap();
    assert!(
        disposition
            .to_str()
            .unwrap()
            .contains(&format_day(today))
    );

    let body = body_text(response).await;
    let mut lines = body.lines();
    assert_eq!(lines.next(), Some(CSV_HEADER));
    // Rows carry the module and debug id, not the requested filename
    let expected = format!("xul.pdb,{},xul.dll,ABC123", DEBUG_ID);
    assert!(
        lines.any(|line| line == expected),
        "row missing from report: {body}"
    );
}

#[tokio::test]
async fn test_csv_default_report_excludes_todays_records() {
    let server = TestServer::new().await;

    get(&server.router, &sym_uri("xul.pdb", DEBUG_ID, "xul.sym")).await;

    // Without ?today the report covers yesterday's closed window
    let response = get(&server.router, "/missingsymbols.csv").await;
    assert_eq!(body_text(response).await, format!("{CSV_HEADER}\n"));
}

#[tokio::test]
async fn test_csv_with_telemetry_disabled_is_header_only() {
    let server = TestServer::with_config(|config| config.telemetry.enabled = false).await;

    get(&server.router, &sym_uri("xul.pdb", DEBUG_ID, "xul.sym")).await;

    let response = get(&server.router, "/missingsymbols.csv?today=true").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, format!("{CSV_HEADER}\n"));
}
