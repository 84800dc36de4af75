//! Log search endpoint.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use log_core::{Error, SearchFilter};
use std::time::Instant;
use telemetry::metrics;
use tracing::{error, info};

use crate::response::{ApiError, SearchResponse};
use crate::state::AppState;

/// GET /search - Filtered, newest-first retrieval.
pub async fn search_handler(
    State(state): State<AppState>,
    query: Result<Query<SearchFilter>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(filter) = query.map_err(|e| Error::invalid_filter(e.body_text()))?;

    let start = Instant::now();
    metrics().searches.inc();

    let events = state.search.search(&filter).await.map_err(|e| {
        metrics().search_errors.inc();
        if !e.is_validation() {
            error!(error = %e, "Log search failed");
        }
        e
    })?;

    let latency_ms = start.elapsed().as_millis() as u64;
    metrics().search_latency_ms.observe(latency_ms);

    info!(
        results = events.len(),
        latency_ms = latency_ms,
        "Search completed"
    );

    Ok(Json(SearchResponse::success(events)))
}
