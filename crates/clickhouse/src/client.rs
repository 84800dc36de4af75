//! ClickHouse client wrapper.

use crate::config::ClickHouseConfig;
use crate::schema::is_valid_identifier;
use clickhouse::Client;
use log_core::{Error, Result};
use tracing::info;

/// Thin wrapper over the `clickhouse` HTTP client. Cheap to clone.
#[derive(Clone)]
pub struct ClickHouseClient {
    inner: Client,
    config: ClickHouseConfig,
}

impl ClickHouseClient {
    /// Creates a new ClickHouse client. No connection is made until the
    /// first query.
    pub fn new(config: ClickHouseConfig) -> Result<Self> {
        if !is_valid_identifier(&config.database) {
            return Err(Error::internal(format!(
                "invalid ClickHouse database name: {:?}",
                config.database
            )));
        }

        let mut client = Client::default()
            .with_url(&config.url)
            .with_database(&config.database)
            .with_option("max_execution_time", config.timeout_secs.to_string());

        if let Some(ref user) = config.username {
            client = client.with_user(user);
        }

        if let Some(ref pass) = config.password {
            client = client.with_password(pass);
        }

        info!(
            url = %config.url,
            database = %config.database,
            "Created ClickHouse client"
        );

        Ok(Self {
            inner: client,
            config,
        })
    }

    /// Returns the inner clickhouse client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClickHouseConfig {
        &self.config
    }
}
