//! ClickHouse health checks and schema setup.

use crate::client::ClickHouseClient;
use crate::schema::{create_database, is_valid_identifier, CREATE_LOGS_TABLE};
use log_core::{Error, Result};
use tracing::{debug, error, info};

/// Check ClickHouse connection health.
pub async fn check_connection(client: &ClickHouseClient) -> bool {
    match client.inner().query("SELECT 1").fetch_one::<u8>().await {
        Ok(_) => {
            debug!("ClickHouse connection healthy");
            true
        }
        Err(e) => {
            error!("ClickHouse health check failed: {}", e);
            false
        }
    }
}

/// Creates the database and the `logs` table if missing.
pub async fn init_schema(client: &ClickHouseClient) -> Result<()> {
    let database = &client.config().database;
    if !is_valid_identifier(database) {
        return Err(Error::internal(format!(
            "invalid ClickHouse database name: {:?}",
            database
        )));
    }

    // The target database may not exist yet, so create it from `default`.
    client
        .inner()
        .clone()
        .with_database("default")
        .query(&create_database(database))
        .execute()
        .await
        .map_err(|e| Error::internal(format!("Schema init error: {}", e)))?;

    client
        .inner()
        .query(CREATE_LOGS_TABLE)
        .execute()
        .await
        .map_err(|e| Error::internal(format!("Schema init error: {}", e)))?;

    info!(database = %database, "ClickHouse schema initialized");
    Ok(())
}
