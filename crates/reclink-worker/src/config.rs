//! Configuration management

use serde::{Deserialize, Serialize};

// ============================================================================
// Worker Configuration Constants
// ============================================================================

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/reclink";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default idle delay between scheduler scans in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;

/// Default delay before resubmitting a refused import batch in seconds.
pub const DEFAULT_IMPORT_RETRY_SECS: u64 = 3;

/// Default number of messages fetched from a queue per round-trip.
pub const DEFAULT_QUEUE_BATCH_SIZE: u32 = 100;

/// Default User-Agent sent to the import API.
pub const DEFAULT_IMPORT_USER_AGENT: &str = "reclink-worker/0.1";

/// Worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub import_api: ImportApiConfig,
    pub scheduler: SchedulerConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// Batch-import API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

/// Scheduler timing and batching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub poll_interval_secs: u64,
    pub import_retry_secs: u64,
    pub queue_batch_size: u32,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS),
                min_connections: std::env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_MIN_CONNECTIONS),
                connect_timeout_secs: std::env::var("DATABASE_CONNECT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS),
                idle_timeout_secs: std::env::var("DATABASE_IDLE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_IDLE_TIMEOUT_SECS),
            },
            import_api: ImportApiConfig {
                base_url: std::env::var("IMPORT_API_URL").unwrap_or_default(),
                username: std::env::var("IMPORT_API_USERNAME").unwrap_or_default(),
                password: std::env::var("IMPORT_API_PASSWORD").unwrap_or_default(),
                user_agent: std::env::var("IMPORT_API_USER_AGENT")
                    .unwrap_or_else(|_| DEFAULT_IMPORT_USER_AGENT.to_string()),
            },
            scheduler: SchedulerConfig {
                poll_interval_secs: std::env::var("POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
                import_retry_secs: std::env::var("IMPORT_RETRY_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_IMPORT_RETRY_SECS),
                queue_batch_size: std::env::var("QUEUE_BATCH_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_QUEUE_BATCH_SIZE),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if self.import_api.base_url.is_empty() {
            anyhow::bail!("Import API URL (IMPORT_API_URL) must be set");
        }

        if self.scheduler.queue_batch_size == 0 {
            anyhow::bail!("Queue batch size must be greater than 0");
        }

        if self.import_api.username.is_empty() {
            tracing::warn!("No import API credentials configured - requests will be anonymous");
        }

        Ok(())
    }
}
