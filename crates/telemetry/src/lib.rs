//! Internal telemetry for the log processor.
//!
//! Structured logging via `tracing`, in-process counters for the
//! ingestion and search paths, and a component health registry.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
