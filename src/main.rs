//! Log Processor
//!
//! Accepts raw log events over HTTP, enriches them concurrently and persists
//! them to ClickHouse:
//! - Bounded intake with explicit backpressure (503 + Retry-After)
//! - Capped-concurrency enrichment (id, defaults, processed_at)
//! - One-at-a-time sink worker with tagged outcomes
//! - Filtered, newest-first search over stored events

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};

use api::{router, AppState};
use clickhouse_client::{ClickHouseClient, ClickHouseConfig, ClickHouseStore};
use log_core::SearchEngine;
use pipeline::{EnrichmentPipeline, PipelineConfig, SinkConfig, SinkWorker};
use telemetry::{health, init_tracing_from_env, spawn_metrics_reporter};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default)]
    pipeline: PipelineConfig,

    #[serde(default)]
    sink: SinkConfig,

    #[serde(default)]
    clickhouse: ClickHouseConfig,

    /// Period of the metrics snapshot log line; 0 disables it
    #[serde(default = "default_metrics_interval_secs")]
    metrics_interval_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_metrics_interval_secs() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            pipeline: PipelineConfig::default(),
            sink: SinkConfig::default(),
            clickhouse: ClickHouseConfig::default(),
            metrics_interval_secs: default_metrics_interval_secs(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting Log Processor v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    // Initialize ClickHouse client
    let clickhouse = ClickHouseClient::new(config.clickhouse.clone())
        .context("Failed to create ClickHouse client")?;

    if let Err(e) = clickhouse_client::health::init_schema(&clickhouse).await {
        error!("Failed to initialize ClickHouse schema: {}", e);
        // Continue anyway - schema might already exist
    }

    check_health(&clickhouse).await;

    let store = Arc::new(ClickHouseStore::new(clickhouse));

    // Enrichment pipeline and its sole output consumer
    let (pipeline, output) = EnrichmentPipeline::start(config.pipeline.clone());
    let pipeline = Arc::new(pipeline);

    let sink_worker = SinkWorker::with_config(store.clone(), config.sink.clone());
    let sink_handle = tokio::spawn(sink_worker.run(output));

    let metrics_handle = (config.metrics_interval_secs > 0)
        .then(|| spawn_metrics_reporter(Duration::from_secs(config.metrics_interval_secs)));

    let state = AppState::new(pipeline.clone(), SearchEngine::new(store));
    let app = router(state);

    // Start HTTP server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // No request handlers remain, so nothing can submit after this point.
    info!("Shutting down...");
    pipeline.close().await;

    match sink_handle.await {
        Ok(summary) => info!(
            persisted = summary.persisted,
            dropped = summary.dropped,
            "Sink drained"
        ),
        Err(e) => error!("Sink worker failed: {}", e),
    }

    if let Some(handle) = metrics_handle {
        handle.abort();
    }

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("LOG_PROCESSOR")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Manual overrides for nested ClickHouse config
    // The config crate's nested parsing doesn't work reliably with underscored field names
    if let Ok(url) = std::env::var("LOG_PROCESSOR_CLICKHOUSE_URL") {
        config.clickhouse.url = url;
    }
    if let Ok(database) = std::env::var("LOG_PROCESSOR_CLICKHOUSE_DATABASE") {
        config.clickhouse.database = database;
    }
    if let Ok(username) = std::env::var("LOG_PROCESSOR_CLICKHOUSE_USERNAME") {
        config.clickhouse.username = Some(username);
    }
    if let Ok(password) = std::env::var("LOG_PROCESSOR_CLICKHOUSE_PASSWORD") {
        config.clickhouse.password = Some(password);
    }

    info!(
        intake_capacity = config.pipeline.intake_capacity,
        output_capacity = config.pipeline.output_capacity,
        max_in_flight = config.pipeline.max_in_flight,
        submit_policy = ?config.pipeline.submit_policy,
        max_retries = config.sink.max_retries,
        clickhouse_url = %config.clickhouse.url,
        "Loaded configuration"
    );

    Ok(config)
}

/// Check component health on startup.
async fn check_health(clickhouse: &ClickHouseClient) {
    let ch_healthy = clickhouse_client::health::check_connection(clickhouse).await;
    if ch_healthy {
        health().clickhouse.set_healthy();
        info!("ClickHouse connection: healthy");
    } else {
        health().clickhouse.set_unhealthy("Connection failed");
        error!("ClickHouse connection: unhealthy");
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
