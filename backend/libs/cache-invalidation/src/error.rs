//! Error types for cache invalidation operations

use thiserror::Error;

/// Cache invalidation errors
#[derive(Error, Debug)]
pub enum InvalidationError {
    /// Redis connection or operation error
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Message serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed cache key or path
    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}
