//! Application state shared across handlers.

use log_core::SearchEngine;
use pipeline::EnrichmentPipeline;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Intake side of the enrichment pipeline
    pub pipeline: Arc<EnrichmentPipeline>,
    /// Read side of the log store
    pub search: SearchEngine,
    started_at: Instant,
}

impl AppState {
    pub fn new(pipeline: Arc<EnrichmentPipeline>, search: SearchEngine) -> Self {
        Self {
            pipeline,
            search,
            started_at: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
