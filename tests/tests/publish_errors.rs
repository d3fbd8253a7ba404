//! Tests for error handling on the publish path.
//!
//! These tests verify that the API returns the right status and error code
//! for every failure the admission pipeline can surface.

use axum::http::StatusCode;
use integration_tests::{
    fixtures::{self, GROUP_ID, USER_ID},
    mocks::{MockQuota, QuotaBehavior},
    setup::TestContext,
};

/// Missing group header returns AUTH_001
#[tokio::test]
async fn test_missing_principal_returns_401() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/v1/events")
        // No X-Group-Id header
        .add_header("X-User-Id", USER_ID)
        .json(&fixtures::event("https://feed.example"))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "AUTH_001");
    assert!(ctx.quota.requests().is_empty());
}

/// Overlong principal id is a validation error, not an auth error
#[tokio::test]
async fn test_overlong_principal_returns_400() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let long_group = "g".repeat(300);

    let response = server
        .post("/v1/events")
        .add_header("X-Group-Id", long_group.as_str())
        .add_header("X-User-Id", USER_ID)
        .json(&fixtures::event("https://feed.example"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_001");
    assert!(ctx.quota.requests().is_empty());
}

/// Deny-list hit on the first event rejects the whole batch
#[tokio::test]
async fn test_first_event_denied_returns_403() {
    let ctx = TestContext::with_deny_list(&["source:https://spam"]).await;
    let server = ctx.server();

    let batch = fixtures::batch(vec![
        fixtures::event("https://spam.example"),
        fixtures::event("https://ok.example"),
        fixtures::event("https://ok.example"),
    ]);

    let response = server
        .post("/v1/events/batch")
        .add_header("X-Group-Id", GROUP_ID)
        .add_header("X-User-Id", USER_ID)
        .json(&batch)
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "DENY_001");
    assert_eq!(body["error"], "forbidden by prefix: source:https://spam");

    // Rejection happens before any quota is consumed
    assert!(ctx.quota.requests().is_empty());
    assert_eq!(ctx.sink.event_count(), 0);
}

/// Longest registered prefix is the one reported
#[tokio::test]
async fn test_longest_prefix_reported() {
    let ctx = TestContext::with_deny_list(&["source:foo", "source:foobar"]).await;
    let server = ctx.server();

    let response = server
        .post("/v1/events")
        .add_header("X-Group-Id", GROUP_ID)
        .json(&fixtures::event("foobarbaz"))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "forbidden by prefix: source:foobar");
}

/// Zero grant returns QUOTA_003 and forwards nothing
#[tokio::test]
async fn test_quota_exhausted_returns_429() {
    let ctx = TestContext::with_quota(MockQuota::with_behavior(QuotaBehavior::Grant {
        count: 0,
        owner: USER_ID.to_string(),
        just_exhausted: false,
    }))
    .await;
    let server = ctx.server();

    let response = server
        .post("/v1/events/batch")
        .add_header("X-Group-Id", GROUP_ID)
        .add_header("X-User-Id", USER_ID)
        .json(&fixtures::batch(fixtures::events(3, "https://feed.example")))
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "QUOTA_003");
    assert_eq!(ctx.sink.event_count(), 0);
    assert!(ctx.quota.releases().is_empty());
}

/// Unreachable quota authority returns QUOTA_001
#[tokio::test]
async fn test_quota_unavailable_returns_503() {
    let ctx = TestContext::with_quota(MockQuota::with_behavior(QuotaBehavior::Unavailable)).await;
    let server = ctx.server();

    let response = server
        .post("/v1/events")
        .add_header("X-Group-Id", GROUP_ID)
        .add_header("X-User-Id", USER_ID)
        .json(&fixtures::event("https://feed.example"))
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "QUOTA_001");
    assert_eq!(ctx.sink.event_count(), 0);
}

/// Malformed quota request returns QUOTA_002
#[tokio::test]
async fn test_quota_invalid_returns_400() {
    let ctx = TestContext::with_quota(MockQuota::with_behavior(QuotaBehavior::Invalid)).await;
    let server = ctx.server();

    let response = server
        .post("/v1/events")
        .add_header("X-Group-Id", GROUP_ID)
        .add_header("X-User-Id", USER_ID)
        .json(&fixtures::event("https://feed.example"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "QUOTA_002");
}

/// Sink failure returns SINK_001 and releases the whole grant
#[tokio::test]
async fn test_sink_failure_returns_502() {
    let ctx = TestContext::new().await;
    ctx.sink.set_should_fail(true);
    let server = ctx.server();

    let response = server
        .post("/v1/events/batch")
        .add_header("X-Group-Id", GROUP_ID)
        .add_header("X-User-Id", USER_ID)
        .json(&fixtures::batch(fixtures::events(2, "https://feed.example")))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "SINK_001");

    let releases = ctx.quota.releases();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].count, 2);
}

/// Nothing acknowledged without an error returns 503
#[tokio::test]
async fn test_zero_ack_returns_503() {
    let ctx = TestContext::new().await;
    ctx.sink.set_ack_limit(Some(0));
    let server = ctx.server();

    let response = server
        .post("/v1/events")
        .add_header("X-Group-Id", GROUP_ID)
        .add_header("X-User-Id", USER_ID)
        .json(&fixtures::event("https://feed.example"))
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "SINK_002");
    assert_eq!(ctx.quota.releases()[0].count, 1);
}

/// Empty batch returns VALID_003
#[tokio::test]
async fn test_empty_batch_returns_400() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/v1/events/batch")
        .add_header("X-Group-Id", GROUP_ID)
        .json(&fixtures::batch(vec![]))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_003");
}

/// Too many events returns VALID_002
#[tokio::test]
async fn test_oversized_batch_returns_400() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/v1/events/batch")
        .add_header("X-Group-Id", GROUP_ID)
        .json(&fixtures::batch(fixtures::events(1001, "https://f")))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_002");
}

/// Malformed JSON returns VALID_001
#[tokio::test]
async fn test_invalid_json_returns_400() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/v1/events")
        .add_header("X-Group-Id", GROUP_ID)
        .text("{not json")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_001");
}

/// Second internal write within the minute is throttled, whatever its group
#[tokio::test]
async fn test_internal_rate_limited() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let first = server
        .post("/v1/events/internal")
        .add_header("X-Group-Id", GROUP_ID)
        .json(&fixtures::event("https://feed.example"))
        .await;
    first.assert_status_ok();

    // The limit is shared across groups
    let second = server
        .post("/v1/events/internal")
        .add_header("X-Group-Id", "another-group")
        .json(&fixtures::event("https://feed.example"))
        .await;

    second.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = second.json();
    assert_eq!(body["code"], "RATE_001");
    assert!(second.headers().get("Retry-After").is_some());
    assert_eq!(ctx.sink.internal_events().len(), 1);
}
