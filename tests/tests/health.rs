//! Tests for health check endpoints.
//!
//! These tests verify the health endpoints return correct status and structure.

use axum::http::StatusCode;
use integration_tests::{
    fixtures::{self, GROUP_ID, USER_ID},
    setup::TestContext,
};
use telemetry::health;

/// Test /health endpoint returns proper structure
#[tokio::test]
async fn test_health_endpoint_structure() {
    let ctx = TestContext::with_deny_list(&["source:a", "source:b", "type:c"]).await;
    let server = ctx.server();

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();

    for field in [
        "status",
        "redpanda_connected",
        "quota_connected",
        "deny_list_loaded",
        "deny_list_entries",
        "metrics",
    ] {
        assert!(
            body.get(field).is_some(),
            "Response should have '{}' field",
            field
        );
    }
    assert_eq!(body["deny_list_entries"], 3);
    assert_eq!(body["deny_list_loaded"], true);
}

/// Test /health reports publish counters
#[tokio::test]
async fn test_health_reports_metrics() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    server
        .post("/v1/events/batch")
        .add_header("X-Group-Id", GROUP_ID)
        .add_header("X-User-Id", USER_ID)
        .json(&fixtures::batch(fixtures::events(2, "https://feed.example")))
        .await
        .assert_status_ok();

    let body: serde_json::Value = server.get("/health").await.json();
    let metrics = &body["metrics"];

    // Counters are process-wide, other tests may have added to them.
    assert!(metrics["batches_received"].as_u64().unwrap() >= 1);
    assert!(metrics["events_received"].as_u64().unwrap() >= 2);
    assert!(metrics["publish_latency_buckets"].is_array());
}

/// Test /health/ready once the sink and deny-list are up
#[tokio::test]
async fn test_ready_endpoint() {
    let ctx = TestContext::new().await;
    health().redpanda.set_healthy();
    let server = ctx.server();

    let response = server.get("/health/ready").await;
    response.assert_status(StatusCode::OK);
}

/// Test /health/live always returns 200
#[tokio::test]
async fn test_live_endpoint() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.get("/health/live").await;
    response.assert_status(StatusCode::OK);
}
