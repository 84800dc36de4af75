//! Mock implementations for testing.

use async_trait::async_trait;
use log_core::{EnrichedEvent, Error, EventSink, LogStore, Result, SearchQuery};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// In-memory log store.
///
/// Implements both `EventSink` and `LogStore`, so the real sink worker and
/// search engine run against it unchanged. Search semantics come from
/// `SearchQuery::apply`, which mirrors the ClickHouse query.
#[derive(Clone)]
pub struct MemoryStore {
    events: Arc<Mutex<Vec<EnrichedEvent>>>,
    /// Simulate failures if set.
    should_fail: Arc<Mutex<bool>>,
    /// Writes block while the gate is closed.
    gate: Arc<watch::Sender<bool>>,
    searches: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
            gate: Arc::new(gate),
            searches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get all stored events, in insertion order.
    pub fn stored_events(&self) -> Vec<EnrichedEvent> {
        self.events.lock().clone()
    }

    /// Get the count of stored events.
    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }

    /// Store an event directly, bypassing the pipeline.
    pub fn seed(&self, event: EnrichedEvent) {
        self.events.lock().push(event);
    }

    /// Set failure mode for testing error handling.
    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }

    /// Block every write until `resume` is called.
    pub fn pause_writes(&self) {
        self.gate.send_replace(false);
    }

    pub fn resume_writes(&self) {
        self.gate.send_replace(true);
    }

    /// Number of searches that reached the store.
    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSink for MemoryStore {
    async fn persist(&self, event: &EnrichedEvent) -> Result<()> {
        let mut gate = self.gate.subscribe();
        while !*gate.borrow_and_update() {
            if gate.changed().await.is_err() {
                break;
            }
        }

        if *self.should_fail.lock() {
            return Err(Error::store_failed("Mock store failure"));
        }

        self.events.lock().push(event.clone());
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        !*self.should_fail.lock()
    }
}

#[async_trait]
impl LogStore for MemoryStore {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<EnrichedEvent>> {
        self.searches.fetch_add(1, Ordering::SeqCst);

        if *self.should_fail.lock() {
            return Err(Error::query_failed("Mock store failure"));
        }

        let events = self.events.lock();
        Ok(query.apply(events.iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use log_core::SearchFilter;

    #[tokio::test]
    async fn test_memory_store_persists_and_searches() {
        let store = MemoryStore::new();
        store
            .persist(&fixtures::enriched("a", "disk full", "ERROR", "host-1"))
            .await
            .unwrap();
        store.seed(fixtures::enriched("b", "all good", "INFO", "host-2"));

        let query = SearchQuery::from_filter(&SearchFilter::new().severity("ERROR")).unwrap();
        let found = store.search(&query).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a");
        assert_eq!(store.search_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_failure_mode() {
        let store = MemoryStore::new();
        store.set_should_fail(true);

        let result = store.persist(&fixtures::enriched("a", "m", "INFO", "s")).await;
        assert!(result.is_err());
        assert!(!store.is_healthy());
        assert_eq!(store.event_count(), 0);
    }
}
