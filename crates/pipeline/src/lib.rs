//! Enrichment pipeline and sink worker.
//!
//! - `pipeline`: bounded intake, concurrent enrichment, bounded output
//! - `enrichment`: identity and default-filling for raw events
//! - `sink`: one-at-a-time persistence of enriched events

pub mod config;
pub mod enrichment;
pub mod pipeline;
pub mod sink;

pub use config::{PipelineConfig, SinkConfig, SubmitPolicy};
pub use enrichment::Enricher;
pub use pipeline::EnrichmentPipeline;
pub use sink::{SinkOutcome, SinkSummary, SinkWorker};
