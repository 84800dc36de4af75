//! Tests for log search over HTTP.
//!
//! The store is seeded directly so ordering and time ranges are exact.

use axum::http::StatusCode;
use integration_tests::{fixtures, setup::TestContext};

fn ids(body: &serde_json::Value) -> Vec<String> {
    body["data"]
        .as_array()
        .expect("data array")
        .iter()
        .map(|e| e["id"].as_str().unwrap().to_string())
        .collect()
}

/// No filters returns everything, newest processed first.
#[tokio::test]
async fn test_no_filter_returns_all_newest_first() {
    let ctx = TestContext::new().await;
    let base = fixtures::at("2025-01-10T12:00:00Z");
    ctx.store.seed(fixtures::enriched_at("a", "one", base, base));
    ctx.store.seed(fixtures::enriched_at("b", "two", base, fixtures::plus_secs(base, 20)));
    ctx.store.seed(fixtures::enriched_at("c", "three", base, fixtures::plus_secs(base, 10)));

    let response = ctx.server().get("/search").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "success");
    assert_eq!(ids(&body), vec!["b", "c", "a"]);
}

/// Equal processing times fall back to id, descending.
#[tokio::test]
async fn test_ties_broken_by_id() {
    let ctx = TestContext::new().await;
    let t = fixtures::at("2025-01-10T12:00:00Z");
    ctx.store.seed(fixtures::enriched_at("id-1", "m", t, t));
    ctx.store.seed(fixtures::enriched_at("id-2", "m", t, t));

    let body: serde_json::Value = ctx.server().get("/search").await.json();
    assert_eq!(ids(&body), vec!["id-2", "id-1"]);
}

/// Source is an exact match.
#[tokio::test]
async fn test_source_filter() {
    let ctx = TestContext::new().await;
    ctx.store.seed(fixtures::enriched("1", "a", "INFO", "web-app"));
    ctx.store.seed(fixtures::enriched("2", "b", "INFO", "web-app-2"));
    ctx.store.seed(fixtures::enriched("3", "c", "INFO", "worker"));

    let response = ctx
        .server()
        .get("/search")
        .add_query_param("source", "web-app")
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(ids(&body), vec!["1"]);
}

/// Severity and message substring combine with AND.
#[tokio::test]
async fn test_severity_and_message_filters() {
    let ctx = TestContext::new().await;
    ctx.store.seed(fixtures::enriched("1", "request timeout after 30s", "ERROR", "api"));
    ctx.store.seed(fixtures::enriched("2", "request timeout after 30s", "WARN", "api"));
    ctx.store.seed(fixtures::enriched("3", "connection refused", "ERROR", "api"));

    let response = ctx
        .server()
        .get("/search")
        .add_query_param("severity", "ERROR")
        .add_query_param("message", "timeout")
        .await;

    let body: serde_json::Value = response.json();
    assert_eq!(ids(&body), vec!["1"]);
}

/// A single-day range includes the last second of that day and nothing after.
#[tokio::test]
async fn test_single_day_range_includes_end_of_day() {
    let ctx = TestContext::new().await;
    let processed = fixtures::at("2025-02-01T00:00:00Z");
    for (id, ts) in [
        ("before", "2025-01-14T23:59:59Z"),
        ("start", "2025-01-15T00:00:00Z"),
        ("late", "2025-01-15T23:59:59Z"),
        ("after", "2025-01-16T00:00:00Z"),
    ] {
        ctx.store.seed(fixtures::enriched_at(id, "m", fixtures::at(ts), processed));
    }

    let response = ctx
        .server()
        .get("/search")
        .add_query_param("start_date", "2025-01-15")
        .add_query_param("end_date", "2025-01-15")
        .await;

    response.assert_status_ok();
    let mut found = ids(&response.json::<serde_json::Value>());
    found.sort();
    assert_eq!(found, vec!["late", "start"]);
}

/// Limit caps the number of returned rows.
#[tokio::test]
async fn test_limit() {
    let ctx = TestContext::new().await;
    let base = fixtures::at("2025-01-10T12:00:00Z");
    for i in 0..5 {
        let t = fixtures::plus_secs(base, i);
        ctx.store.seed(fixtures::enriched_at(&format!("e{}", i), "m", t, t));
    }

    let response = ctx
        .server()
        .get("/search")
        .add_query_param("limit", "2")
        .await;

    let body: serde_json::Value = response.json();
    assert_eq!(ids(&body), vec!["e4", "e3"]);
}

/// Unparsable dates are rejected before the store is touched.
#[tokio::test]
async fn test_invalid_dates_return_valid_004() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    for (param, value) in [
        ("end_date", "not-a-date"),
        ("start_date", "not-a-date"),
        ("start_date", "2025-13-01"),
    ] {
        let response = server.get("/search").add_query_param(param, value).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "VALID_004", "{}={}", param, value);
    }

    assert_eq!(ctx.store.search_count(), 0);
}

/// A start date after the end date is a valid, empty search.
#[tokio::test]
async fn test_inverted_range_returns_empty_success() {
    let ctx = TestContext::new().await;
    let t = fixtures::at("2025-01-15T12:00:00Z");
    ctx.store.seed(fixtures::enriched_at("mid", "m", t, t));

    let response = ctx
        .server()
        .get("/search")
        .add_query_param("start_date", "2025-01-20")
        .add_query_param("end_date", "2025-01-10")
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "success");
    assert!(ids(&body).is_empty());
    assert_eq!(ctx.store.search_count(), 1);
}

/// Dates must be zero-padded YYYY-MM-DD with nothing around them.
#[tokio::test]
async fn test_loose_date_forms_return_valid_004() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    for value in ["2025-1-5", "2025-01-5", " 2025-01-05", "+2025-01-05"] {
        let response = server.get("/search").add_query_param("end_date", value).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "VALID_004", "end_date={:?}", value);
    }

    assert_eq!(ctx.store.search_count(), 0);
}

/// Empty query fields, limit included, impose no constraint.
#[tokio::test]
async fn test_empty_fields_including_limit_are_ignored() {
    let ctx = TestContext::new().await;
    ctx.store.seed(fixtures::enriched("1", "a", "INFO", "web-app"));
    ctx.store.seed(fixtures::enriched("2", "b", "WARN", "worker"));

    let response = ctx.server().get("/search?source=&limit=").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(ids(&body).len(), 2);
}

/// Non-numeric or out-of-range limits are rejected.
#[tokio::test]
async fn test_invalid_limit_returns_valid_004() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    for value in ["abc", "0", "10001"] {
        let response = server.get("/search").add_query_param("limit", value).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "VALID_004", "limit={}", value);
    }
}

/// Store failures surface as DB_002.
#[tokio::test]
async fn test_store_failure_returns_500() {
    let ctx = TestContext::new().await;
    ctx.store.set_should_fail(true);

    let response = ctx.server().get("/search").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "DB_002");
}

/// Events ingested over HTTP are findable once persisted.
#[tokio::test]
async fn test_ingested_event_is_searchable() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    server
        .post("/logs")
        .json(&fixtures::raw_event("payment declined", "WARN", "billing"))
        .await
        .assert_status_ok();
    ctx.wait_for_persisted(1).await;

    let response = server
        .get("/search")
        .add_query_param("source", "billing")
        .await;
    let body: serde_json::Value = response.json();

    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["message"], "payment declined");
    assert_eq!(body["data"][0]["severity"], "WARN");

    ctx.shutdown().await;
}
