//! Row mapping and inserts for the `logs` table.

use crate::client::ClickHouseClient;
use crate::schema::LOGS_TABLE;
use chrono::{DateTime, Utc};
use clickhouse::Row;
use log_core::{EnrichedEvent, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One row of the `logs` table.
#[derive(Debug, Clone, PartialEq, Eq, Row, Serialize, Deserialize)]
pub struct LogRow {
    pub id: String,
    pub message: String,
    pub severity: String,
    pub source: String,
    pub timestamp: i64,    // DateTime64(3) as milliseconds
    pub processed_at: i64, // DateTime64(3) as milliseconds
}

impl From<&EnrichedEvent> for LogRow {
    fn from(event: &EnrichedEvent) -> Self {
        Self {
            id: event.id.clone(),
            message: event.message.clone(),
            severity: event.severity.clone(),
            source: event.source.clone(),
            timestamp: event.timestamp.timestamp_millis(),
            processed_at: event.processed_at.timestamp_millis(),
        }
    }
}

impl LogRow {
    /// Converts a stored row back into an event.
    pub fn into_event(self) -> Result<EnrichedEvent> {
        Ok(EnrichedEvent {
            timestamp: from_millis(self.timestamp)?,
            processed_at: from_millis(self.processed_at)?,
            id: self.id,
            message: self.message,
            severity: self.severity,
            source: self.source,
        })
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| Error::query_failed(format!("stored timestamp out of range: {}", ms)))
}

/// Inserts a single enriched event.
pub async fn insert_log(client: &ClickHouseClient, event: &EnrichedEvent) -> Result<()> {
    let start = std::time::Instant::now();
    let row = LogRow::from(event);

    let mut insert = client
        .inner()
        .insert(LOGS_TABLE)
        .map_err(|e| Error::store_failed(format!("Insert error: {}", e)))?;

    insert
        .write(&row)
        .await
        .map_err(|e| Error::store_failed(format!("Write error: {}", e)))?;

    insert
        .end()
        .await
        .map_err(|e| Error::store_failed(format!("End error: {}", e)))?;

    debug!(
        id = %row.id,
        latency_ms = %start.elapsed().as_millis(),
        "Inserted log row"
    );

    Ok(())
}
