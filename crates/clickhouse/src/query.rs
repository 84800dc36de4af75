//! Filtered reads from the `logs` table.
//!
//! The WHERE clause comes from [`SearchQuery::where_clause`], which only
//! ever contains fixed fragments with `?` placeholders; every filter value
//! is bound.

use crate::client::ClickHouseClient;
use crate::insert::LogRow;
use crate::schema::LOGS_TABLE;
use log_core::{EnrichedEvent, Error, QueryParam, Result, SearchQuery};
use tracing::debug;

const COLUMNS: &str = "id, message, severity, source, timestamp, processed_at";

/// Renders the SELECT for a search. Newest first, ties broken by id.
pub fn select_sql(query: &SearchQuery) -> String {
    let mut sql = format!(
        "SELECT {} FROM {} WHERE {} ORDER BY processed_at DESC, id DESC",
        COLUMNS,
        LOGS_TABLE,
        query.where_clause()
    );
    if query.limit.is_some() {
        sql.push_str(" LIMIT ?");
    }
    sql
}

/// Runs a search and maps rows back to events.
pub async fn search_logs(
    client: &ClickHouseClient,
    query: &SearchQuery,
) -> Result<Vec<EnrichedEvent>> {
    let sql = select_sql(query);
    let mut q = client.inner().query(&sql);

    for param in query.params() {
        q = match param {
            QueryParam::Text(value) => q.bind(value),
            QueryParam::Millis(value) => q.bind(value),
            QueryParam::UInt(value) => q.bind(value),
        };
    }

    let rows: Vec<LogRow> = q
        .fetch_all()
        .await
        .map_err(|e| Error::query_failed(format!("Query error: {}", e)))?;

    debug!(rows = rows.len(), "Fetched log rows");

    rows.into_iter().map(LogRow::into_event).collect()
}
