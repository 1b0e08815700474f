//! Retry and response-classification behavior of the HTTP transport against
//! a scripted local server.

mod common;

use common::http_stub::{StubResponse, StubServer};
use serde_json::json;
use std::time::Duration;
use uni_supply::api::RetryConfig;
use uni_supply::error::EnrichmentError;
use uni_supply::transport::HttpTransport;

fn fast_retry() -> RetryConfig {
    RetryConfig {
        initial_backoff_ms: 1,
    }
}

async fn transport_for(server: &StubServer, max_retries: u32) -> HttpTransport {
    HttpTransport::new(&server.base_url(), Duration::from_secs(5), max_retries)
        .expect("transport")
        .with_retry(fast_retry())
}

#[tokio::test]
async fn server_errors_retried_until_success() {
    let server = StubServer::start(vec![
        StubResponse::text(500, "boom"),
        StubResponse::text(503, "still down"),
        StubResponse::json(200, &json!({"ok": true})),
    ])
    .await;
    let transport = transport_for(&server, 3).await;

    let response = transport.get("status", None).await.expect("eventual success");
    assert_eq!(response.status_code, 200);
    assert!(response.success);
    assert_eq!(server.request_count(), 3);
}

#[tokio::test]
async fn client_errors_fail_immediately() {
    let server = StubServer::start(vec![StubResponse::text(404, "no such part")]).await;
    let transport = transport_for(&server, 3).await;

    let err = transport.get("missing", None).await.unwrap_err();
    assert!(matches!(err, EnrichmentError::ApiError(_)));
    // Terminal 4xx must not consume the retry budget.
    assert_eq!(server.request_count(), 1);
}

#[tokio::test]
async fn exhausted_retry_budget_surfaces_last_error() {
    let server = StubServer::start(vec![
        StubResponse::text(500, "a"),
        StubResponse::text(500, "b"),
        StubResponse::text(500, "c"),
    ])
    .await;
    let transport = transport_for(&server, 2).await;

    let err = transport.get("status", None).await.unwrap_err();
    assert!(matches!(err, EnrichmentError::Unavailable));
    // Initial attempt plus two retries.
    assert_eq!(server.request_count(), 3);
}

#[tokio::test]
async fn rate_limited_honors_retry_after_header() {
    let server = StubServer::start(vec![
        StubResponse::text(429, "slow down").with_header("retry-after", "1"),
        StubResponse::json(200, &json!({"ok": true})),
    ])
    .await;
    let transport = transport_for(&server, 3).await;

    let start = std::time::Instant::now();
    let response = transport.get("status", None).await.expect("retried after wait");
    assert_eq!(response.status_code, 200);
    assert!(start.elapsed() >= Duration::from_secs(1));
    assert_eq!(server.request_count(), 2);
}

#[tokio::test]
async fn unauthorized_without_authorizer_fails_without_retry() {
    let server = StubServer::start(vec![StubResponse::text(401, "who are you")]).await;
    let transport = transport_for(&server, 3).await;

    let err = transport.get("secure", None).await.unwrap_err();
    assert!(matches!(err, EnrichmentError::Unauthorized));
    assert_eq!(server.request_count(), 1);
}

#[tokio::test]
async fn absolute_text_fetch_returns_body() {
    let server = StubServer::start(vec![StubResponse::text(200, "<html>page</html>")]).await;
    let transport = transport_for(&server, 0).await;

    let url = format!("{}/product/C1", server.base_url());
    let body = transport.get_absolute_text(&url).await.expect("page body");
    assert_eq!(body, "<html>page</html>");
    assert_eq!(server.requests(), vec!["GET /product/C1".to_string()]);
}
