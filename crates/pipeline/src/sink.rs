//! Sink worker: drains the output queue into an `EventSink`.
//!
//! Events are persisted strictly one at a time. A failed persist is logged,
//! counted and reported as `SinkOutcome::Dropped`; it is never surfaced to the
//! original submitter. With the default `max_retries = 0` delivery is
//! at-most-once. There is no write-ahead buffer and no dead-letter queue.

use std::sync::Arc;
use std::time::Instant;

use log_core::{EnrichedEvent, Error, EventSink, Result};
use telemetry::metrics;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::SinkConfig;

/// Result of handing one event to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOutcome {
    Persisted { id: String },
    Dropped { id: String, reason: String },
}

impl SinkOutcome {
    pub fn id(&self) -> &str {
        match self {
            Self::Persisted { id } | Self::Dropped { id, .. } => id,
        }
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted { .. })
    }
}

/// Totals reported when the output queue closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkSummary {
    pub persisted: u64,
    pub dropped: u64,
}

/// Sole consumer of the enrichment pipeline's output queue.
pub struct SinkWorker {
    sink: Arc<dyn EventSink>,
    config: SinkConfig,
    outcomes: Option<mpsc::UnboundedSender<SinkOutcome>>,
}

impl SinkWorker {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self::with_config(sink, SinkConfig::default())
    }

    pub fn with_config(sink: Arc<dyn EventSink>, config: SinkConfig) -> Self {
        Self {
            sink,
            config,
            outcomes: None,
        }
    }

    /// Publishes every outcome on `tx` as well as logging it.
    pub fn with_outcome_channel(mut self, tx: mpsc::UnboundedSender<SinkOutcome>) -> Self {
        self.outcomes = Some(tx);
        self
    }

    /// Persists events until the output queue closes.
    pub async fn run(self, mut output: mpsc::Receiver<EnrichedEvent>) -> SinkSummary {
        info!(
            persist_timeout_ms = self.config.persist_timeout_ms,
            max_retries = self.config.max_retries,
            "Sink worker starting"
        );

        let mut summary = SinkSummary::default();

        while let Some(event) = output.recv().await {
            let outcome = self.handle(&event).await;
            match &outcome {
                SinkOutcome::Persisted { .. } => summary.persisted += 1,
                SinkOutcome::Dropped { .. } => summary.dropped += 1,
            }
            if let Some(tx) = &self.outcomes {
                // Nobody listening is fine.
                let _ = tx.send(outcome);
            }
        }

        info!(
            persisted = summary.persisted,
            dropped = summary.dropped,
            "Output queue closed, sink worker stopped"
        );
        summary
    }

    /// Persists one event and classifies the result.
    pub async fn handle(&self, event: &EnrichedEvent) -> SinkOutcome {
        let start = Instant::now();
        let result = self.persist_with_retry(event).await;
        metrics()
            .persist_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        match result {
            Ok(()) => {
                metrics().events_persisted.inc();
                debug!(id = %event.id, "Event persisted");
                SinkOutcome::Persisted {
                    id: event.id.clone(),
                }
            }
            Err(e) => {
                metrics().events_dropped.inc();
                error!(
                    id = %event.id,
                    source = %event.source,
                    error = %e,
                    "Failed to persist event, dropping"
                );
                SinkOutcome::Dropped {
                    id: event.id.clone(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Persists with linear backoff. Every retry may write a duplicate if the
    /// failed attempt actually reached the store.
    async fn persist_with_retry(&self, event: &EnrichedEvent) -> Result<()> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = self.config.retry_backoff() * attempt;
                warn!(
                    id = %event.id,
                    attempt = attempt,
                    backoff_ms = %backoff.as_millis(),
                    "Retrying persist"
                );
                tokio::time::sleep(backoff).await;
            }

            match self.persist_once(event).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    metrics().persist_errors.inc();
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::internal("persist failed with unknown error")))
    }

    async fn persist_once(&self, event: &EnrichedEvent) -> Result<()> {
        let limit = self.config.persist_timeout();
        match tokio::time::timeout(limit, self.sink.persist(event)).await {
            Ok(result) => result,
            Err(_) => Err(Error::store_failed(format!(
                "persist timed out after {}ms",
                limit.as_millis()
            ))),
        }
    }
}
