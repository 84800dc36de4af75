//! `LogStore` and `EventSink` backed by ClickHouse.

use async_trait::async_trait;
use log_core::{EnrichedEvent, EventSink, LogStore, Result, SearchQuery};
use telemetry::health;

use crate::client::ClickHouseClient;
use crate::insert::insert_log;
use crate::query::search_logs;

/// ClickHouse-backed log store. Cheap to clone.
#[derive(Clone)]
pub struct ClickHouseStore {
    client: ClickHouseClient,
}

impl ClickHouseStore {
    pub fn new(client: ClickHouseClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ClickHouseClient {
        &self.client
    }
}

#[async_trait]
impl EventSink for ClickHouseStore {
    async fn persist(&self, event: &EnrichedEvent) -> Result<()> {
        insert_log(&self.client, event).await
    }

    fn is_healthy(&self) -> bool {
        health().clickhouse.is_healthy()
    }
}

#[async_trait]
impl LogStore for ClickHouseStore {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<EnrichedEvent>> {
        search_logs(&self.client, query).await
    }
}
