//! Storage seams.
//!
//! Production uses ClickHouse for both traits; tests swap in in-memory
//! implementations so the pipeline and search paths run unchanged.

use async_trait::async_trait;

use crate::error::Result;
use crate::events::EnrichedEvent;
use crate::filter::SearchQuery;

/// Durable destination for enriched events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Persist one event. Called strictly one event at a time per consumer.
    async fn persist(&self, event: &EnrichedEvent) -> Result<()>;

    fn is_healthy(&self) -> bool {
        true
    }
}

/// Read side of the log store.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Returns every matching event ordered by `processed_at` descending.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<EnrichedEvent>>;
}
