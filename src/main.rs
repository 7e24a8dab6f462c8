//! Sluice batch publisher.
//!
//! Entry point for one scheduled invocation: wires configuration, the
//! PostgreSQL record source, and the resilient topic publisher, then runs
//! the pipeline exactly once. Exit status reflects the invocation result:
//! zero on normal completion (even with per-message publish failures),
//! nonzero when the data source or transformer faults.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use sluice_core::{Clock, RealClock};
use sluice_pipeline::{handle, Config, JsonTransformer, PgRecordSource, Pipeline};
use sluice_publish::{FanOutConfig, FanOutEngine, HttpTopicClient, ResilientPublisher};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting Sluice batch publisher");

    let config = Config::load()?;
    info!(
        topic_arn = %config.topic_arn,
        service_name = %config.service_name,
        environment = %config.environment,
        database_url = %config.database_url_masked(),
        "Configuration loaded"
    );

    let db_pool = create_database_pool(&config).await?;
    info!("Database connection pool established");

    let clock: Arc<dyn Clock> = Arc::new(RealClock::new());
    let transport = Arc::new(
        HttpTopicClient::new(config.to_transport_config())
            .context("Failed to build topic transport")?,
    );
    let publisher =
        Arc::new(ResilientPublisher::new(transport, config.to_publisher_config(), clock.clone()));

    if !publisher.is_healthy().await {
        // Not fatal: retries and the breaker handle a flapping topic, but
        // the operator should know the invocation started degraded.
        tracing::warn!(topic_arn = %config.topic_arn, "topic health probe failed at startup");
    }

    let engine = FanOutEngine::new(publisher, FanOutConfig::default(), clock.clone());
    let pipeline = Pipeline::new(
        PgRecordSource::new(db_pool.clone()),
        JsonTransformer::new(&config.service_name),
        engine,
        clock,
    );

    let stats = handle(&pipeline, serde_json::Value::Null)
        .await
        .context("Pipeline invocation failed")?;

    info!(
        success_count = stats.success_count,
        failure_count = stats.failure_count,
        backpressure_ms = stats.backpressure_ms,
        "Invocation complete"
    );

    db_pool.close().await;
    Ok(())
}

/// Initializes tracing with environment-based configuration.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,sluice=debug"))
        .expect("Invalid RUST_LOG environment variable");

    let fmt_layer = fmt::layer().with_target(true).with_thread_ids(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}

/// Creates the database connection pool with retry logic.
async fn create_database_pool(config: &Config) -> Result<sqlx::PgPool> {
    let mut retries = 0;
    const MAX_RETRIES: u32 = 5;
    const RETRY_DELAY: Duration = Duration::from_secs(2);

    loop {
        match PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => {
                sqlx::query("SELECT 1")
                    .fetch_one(&pool)
                    .await
                    .context("Failed to verify database connection")?;

                return Ok(pool);
            },
            Err(_e) if retries < MAX_RETRIES => {
                retries += 1;
                info!(
                    attempt = retries,
                    max_retries = MAX_RETRIES,
                    "Database connection failed, retrying..."
                );
                tokio::time::sleep(RETRY_DELAY).await;
            },
            Err(e) => {
                return Err(e).context("Failed to create database connection pool after retries");
            },
        }
    }
}
