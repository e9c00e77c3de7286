//! Error types for reclink

use thiserror::Error;

/// Result type alias for reclink operations
pub type Result<T> = std::result::Result<T, LinkError>;

/// Main error type for reclink
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid job config: {0}")]
    InvalidJobConfig(String),

    #[error("Unknown job state: {0}")]
    UnknownJobState(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
