//! Log ingestion endpoint.
//!
//! The body is parsed by hand rather than through `Json<T>` so that size,
//! syntax and field failures each map to their own error code.

use axum::{body::Bytes, extract::State, Json};
use log_core::RawEvent;
use std::time::Instant;
use telemetry::metrics;
use tracing::{debug, warn};

use crate::response::{ApiError, IngestResponse};
use crate::state::AppState;

/// POST /logs - Accept one raw log event.
///
/// Responds as soon as the event is queued; enrichment and persistence
/// happen in the background.
pub async fn ingest_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<IngestResponse>, ApiError> {
    let start = Instant::now();
    metrics().events_received.inc();

    let raw = RawEvent::parse(&body).map_err(|e| {
        metrics().events_failed_validation.inc();
        warn!(payload_size = body.len(), error = %e, "Rejected log event");
        ApiError::from(e)
    })?;

    debug!(
        payload_size = body.len(),
        source = raw.source().unwrap_or("-"),
        "Received log event"
    );

    state.pipeline.submit(raw).await?;

    metrics()
        .ingest_latency_ms
        .observe(start.elapsed().as_millis() as u64);

    Ok(Json(IngestResponse::accepted()))
}
