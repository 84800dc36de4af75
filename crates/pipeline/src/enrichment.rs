//! Event enrichment: identity assignment and default-filling.
//!
//! Pure and I/O-free, so any number of enrichments may run in parallel.

use chrono::{DateTime, Utc};
use log_core::limits::{DEFAULT_SEVERITY, DEFAULT_SOURCE};
use log_core::{EnrichedEvent, RawEvent};
use uuid::Uuid;

/// Turns raw events into enriched ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct Enricher;

impl Enricher {
    /// Creates a new enricher.
    pub fn new() -> Self {
        Self
    }

    /// Enrich a single event using the current time.
    pub fn enrich(&self, raw: RawEvent) -> EnrichedEvent {
        self.enrich_at(raw, Utc::now())
    }

    /// Enrich a single event as of `now`.
    ///
    /// A missing timestamp becomes `now`, the same instant used for
    /// `processed_at`.
    pub fn enrich_at(&self, raw: RawEvent, now: DateTime<Utc>) -> EnrichedEvent {
        let severity = raw.severity().unwrap_or(DEFAULT_SEVERITY).to_string();
        let source = raw.source().unwrap_or(DEFAULT_SOURCE).to_string();
        let timestamp = raw.timestamp.unwrap_or(now);

        EnrichedEvent {
            id: Uuid::new_v4().to_string(),
            message: raw.message,
            severity,
            source,
            timestamp,
            processed_at: now,
        }
    }
}
