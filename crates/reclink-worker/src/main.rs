//! Reclink worker - main entry point

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use reclink_common::logging::{init_logging, LogConfig};
use reclink_worker::config::Config;
use reclink_worker::import::HttpImportClient;
use reclink_worker::queue::PgQueue;
use reclink_worker::store::PgJobStore;
use reclink_worker::Scheduler;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging from the environment, with worker defaults where
    // the environment is silent
    let mut log_config = LogConfig::from_env()?;
    if std::env::var("LOG_FILE_PREFIX").is_err() {
        log_config = log_config.with_file_prefix("reclink-worker");
    }
    if log_config.filter_directives.is_none() {
        log_config = log_config.with_filter_directives("reclink_worker=debug,sqlx=warn");
    }
    init_logging(&log_config)?;

    info!("Starting reclink worker");

    // Load configuration
    let config = Config::load()?;

    // Initialize database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.database.idle_timeout_secs))
        .connect(&config.database.url)
        .await?;

    info!("Database connection pool established");

    // Run migrations
    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;

    info!("Database migrations completed");

    // Wire the collaborators
    let store = Arc::new(PgJobStore::new(db_pool.clone()));
    let queue = Arc::new(PgQueue::new(db_pool, config.scheduler.queue_batch_size));
    let import_client = Arc::new(HttpImportClient::new(config.import_api.clone())?);

    let scheduler = Scheduler::new(
        store,
        queue,
        import_client,
        Duration::from_secs(config.scheduler.poll_interval_secs),
        Duration::from_secs(config.scheduler.import_retry_secs),
    );

    tokio::select! {
        result = scheduler.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        },
    }
}
