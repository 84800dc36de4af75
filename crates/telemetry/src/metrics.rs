//! Internal metrics collection.
//!
//! Counters live in-memory and are periodically logged by a reporter task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrements, saturating at zero.
    pub fn dec(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(v.saturating_sub(1)));
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns bucket counts.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the log processor.
#[derive(Debug, Default)]
pub struct Metrics {
    // Intake
    pub events_received: Counter,
    pub events_accepted: Counter,
    pub events_rejected: Counter,
    pub events_failed_validation: Counter,

    // Enrichment
    pub events_enriched: Counter,
    pub enrichment_deadline_exceeded: Counter,

    // Sink
    pub events_persisted: Counter,
    pub events_dropped: Counter,
    pub persist_errors: Counter,

    // Search
    pub searches: Counter,
    pub search_errors: Counter,

    // Latency histograms
    pub ingest_latency_ms: Histogram,
    pub persist_latency_ms: Histogram,
    pub search_latency_ms: Histogram,

    // Gauges
    pub in_flight_enrichments: Gauge,
    pub backpressure_active: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub events_received: u64,
    pub events_accepted: u64,
    pub events_rejected: u64,
    pub events_failed_validation: u64,
    pub events_enriched: u64,
    pub enrichment_deadline_exceeded: u64,
    pub events_persisted: u64,
    pub events_dropped: u64,
    pub persist_errors: u64,
    pub searches: u64,
    pub search_errors: u64,
    pub ingest_latency_mean_ms: f64,
    pub persist_latency_mean_ms: f64,
    pub search_latency_mean_ms: f64,
    pub in_flight_enrichments: u64,
    pub backpressure_active: bool,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            events_received: self.events_received.get(),
            events_accepted: self.events_accepted.get(),
            events_rejected: self.events_rejected.get(),
            events_failed_validation: self.events_failed_validation.get(),
            events_enriched: self.events_enriched.get(),
            enrichment_deadline_exceeded: self.enrichment_deadline_exceeded.get(),
            events_persisted: self.events_persisted.get(),
            events_dropped: self.events_dropped.get(),
            persist_errors: self.persist_errors.get(),
            searches: self.searches.get(),
            search_errors: self.search_errors.get(),
            ingest_latency_mean_ms: self.ingest_latency_ms.mean(),
            persist_latency_mean_ms: self.persist_latency_ms.mean(),
            search_latency_mean_ms: self.search_latency_ms.mean(),
            in_flight_enrichments: self.in_flight_enrichments.get(),
            backpressure_active: self.backpressure_active.get() > 0,
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}

/// Logs a metrics snapshot on a fixed interval until the task is aborted.
pub fn spawn_metrics_reporter(every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // First tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let s = metrics().snapshot();
            info!(
                received = s.events_received,
                accepted = s.events_accepted,
                rejected = s.events_rejected,
                enriched = s.events_enriched,
                persisted = s.events_persisted,
                dropped = s.events_dropped,
                searches = s.searches,
                in_flight = s.in_flight_enrichments,
                ingest_latency_mean_ms = s.ingest_latency_mean_ms,
                persist_latency_mean_ms = s.persist_latency_mean_ms,
                "Metrics snapshot"
            );
        }
    })
}
