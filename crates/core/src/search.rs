//! Filtered retrieval of stored events.

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::events::EnrichedEvent;
use crate::filter::{SearchFilter, SearchQuery};
use crate::store::LogStore;

/// Validates filters and runs them against a [`LogStore`].
///
/// Read-only; safe to share and call concurrently with ingestion.
#[derive(Clone)]
pub struct SearchEngine {
    store: Arc<dyn LogStore>,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }

    /// Runs a search. Filter validation errors are returned before the
    /// store is queried; store failures are passed through unretried.
    pub async fn search(&self, filter: &SearchFilter) -> Result<Vec<EnrichedEvent>> {
        let query = SearchQuery::from_filter(filter)?;
        debug!(
            predicates = query.predicates.len(),
            limit = ?query.limit,
            "Running log search"
        );
        self.store.search(&query).await
    }
}
