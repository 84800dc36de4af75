//! Tests for the log ingestion path: HTTP edge, pipeline and sink.
//!
//! Runs the real router, pipeline and sink worker over `MemoryStore`.

use axum::http::StatusCode;
use integration_tests::{fixtures, setup::TestContext};
use pipeline::PipelineConfig;
use std::collections::HashSet;

/// A minimal event is accepted, enriched with defaults and persisted.
#[tokio::test]
async fn test_minimal_event_gets_defaults() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/logs")
        .json(&fixtures::minimal_event("user logged in"))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["message"].is_string());
    assert!(body["received_at"].as_i64().unwrap() > 0);

    ctx.wait_for_persisted(1).await;
    let stored = ctx.store.stored_events();
    let event = &stored[0];

    assert!(!event.id.is_empty());
    assert_eq!(event.message, "user logged in");
    assert_eq!(event.severity, "INFO");
    assert_eq!(event.source, "unknown");
    assert_eq!(event.timestamp, event.processed_at);

    let summary = ctx.shutdown().await;
    assert_eq!(summary.persisted, 1);
    assert_eq!(summary.dropped, 0);
}

/// Supplied severity, source and timestamp survive enrichment.
#[tokio::test]
async fn test_supplied_fields_preserved() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/logs")
        .json(&serde_json::json!({
            "message": "upstream timeout",
            "severity": "ERROR",
            "source": "api-gateway",
            "timestamp": "2024-06-01T08:30:00Z",
        }))
        .await;
    response.assert_status_ok();

    ctx.wait_for_persisted(1).await;
    let event = ctx.store.stored_events().remove(0);

    assert_eq!(event.severity, "ERROR");
    assert_eq!(event.source, "api-gateway");
    assert_eq!(event.timestamp, fixtures::at("2024-06-01T08:30:00Z"));
    assert!(event.processed_at > event.timestamp);

    ctx.shutdown().await;
}

/// Empty severity/source strings are treated as absent.
#[tokio::test]
async fn test_empty_strings_get_defaults() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    server
        .post("/logs")
        .json(&fixtures::raw_event("cache warmed", "", ""))
        .await
        .assert_status_ok();

    ctx.wait_for_persisted(1).await;
    let event = ctx.store.stored_events().remove(0);
    assert_eq!(event.severity, "INFO");
    assert_eq!(event.source, "unknown");

    ctx.shutdown().await;
}

/// Malformed JSON returns VALID_001.
#[tokio::test]
async fn test_malformed_json_returns_400() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/logs")
        .content_type("application/json")
        .text("{\"message\": ")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_001");

    let summary = ctx.shutdown().await;
    assert_eq!(summary.persisted, 0);
}

/// A body without a message is a format error.
#[tokio::test]
async fn test_missing_message_returns_400() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/logs")
        .json(&serde_json::json!({ "severity": "WARN" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_001");
}

/// Field validation failures return VALID_002.
#[tokio::test]
async fn test_invalid_fields_return_valid_002() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let empty = server.post("/logs").json(&fixtures::minimal_event("")).await;
    empty.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = empty.json();
    assert_eq!(body["code"], "VALID_002");

    let long_severity = "S".repeat(33);
    let response = server
        .post("/logs")
        .json(&fixtures::raw_event("m", &long_severity, "svc"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_002");
}

/// Bodies over the size limit return VALID_003.
#[tokio::test]
async fn test_oversized_body_returns_valid_003() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let huge = "x".repeat(70 * 1024);
    let response = server
        .post("/logs")
        .json(&fixtures::minimal_event(&huge))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_003");
}

/// With the sink stalled the intake fills, further events get 503 with
/// Retry-After, and every accepted event is persisted once the sink resumes.
#[tokio::test]
async fn test_full_intake_returns_503_and_loses_nothing() {
    let ctx = TestContext::with_config(PipelineConfig {
        intake_capacity: 2,
        output_capacity: 1,
        max_in_flight: 1,
        ..Default::default()
    })
    .await;
    let server = ctx.server();
    ctx.store.pause_writes();

    let mut accepted = HashSet::new();
    let mut rejected = 0;
    for i in 0..30 {
        let message = format!("burst-{}", i);
        let response = server
            .post("/logs")
            .json(&fixtures::minimal_event(&message))
            .await;

        match response.status_code() {
            StatusCode::OK => {
                accepted.insert(message);
            }
            StatusCode::SERVICE_UNAVAILABLE => {
                let body: serde_json::Value = response.json();
                assert_eq!(body["code"], "QUEUE_001");
                assert_eq!(response.header("retry-after"), "1");
                rejected += 1;
            }
            other => panic!("unexpected status {}", other),
        }
        tokio::task::yield_now().await;
    }

    assert!(rejected > 0, "intake never filled");
    assert!(!accepted.is_empty());

    ctx.store.resume_writes();
    let store = ctx.store.clone();
    let summary = ctx.shutdown().await;

    let persisted: HashSet<String> = store
        .stored_events()
        .into_iter()
        .map(|e| e.message)
        .collect();
    assert_eq!(persisted, accepted);
    assert_eq!(summary.persisted as usize, accepted.len());
}

/// Two events sent back to back are both stored; order is not asserted.
#[tokio::test]
async fn test_back_to_back_events_both_stored() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    server
        .post("/logs")
        .json(&fixtures::minimal_event("first"))
        .await
        .assert_status_ok();
    server
        .post("/logs")
        .json(&fixtures::minimal_event("second"))
        .await
        .assert_status_ok();

    ctx.wait_for_persisted(2).await;
    let messages: HashSet<String> = ctx
        .store
        .stored_events()
        .into_iter()
        .map(|e| e.message)
        .collect();
    assert!(messages.contains("first"));
    assert!(messages.contains("second"));

    ctx.shutdown().await;
}

/// Every stored event gets its own id.
#[tokio::test]
async fn test_ids_unique_across_many_events() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    for i in 0..50 {
        server
            .post("/logs")
            .json(&fixtures::raw_event(&format!("event {}", i), "DEBUG", "load-test"))
            .await
            .assert_status_ok();
    }

    ctx.wait_for_persisted(50).await;
    let ids: HashSet<String> = ctx
        .store
        .stored_events()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids.len(), 50);

    ctx.shutdown().await;
}

/// A store failure is logged and counted, never surfaced to the submitter.
#[tokio::test]
async fn test_store_failure_is_not_surfaced() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    ctx.store.set_should_fail(true);

    server
        .post("/logs")
        .json(&fixtures::minimal_event("will be dropped"))
        .await
        .assert_status_ok();

    let store = ctx.store.clone();
    let summary = ctx.shutdown().await;

    assert_eq!(summary.persisted, 0);
    assert_eq!(summary.dropped, 1);
    assert_eq!(store.event_count(), 0);
}
