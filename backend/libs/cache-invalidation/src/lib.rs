//! Cache Invalidation Library using Redis Pub/Sub
//!
//! Broadcasts invalidation messages so rendering layers and caches in other
//! processes drop stale entries.
//!
//! # Architecture
//!
//! ```text
//! thread-service:
//!   1. Commit a new thread in PostgreSQL
//!   2. PUBLISH cache:invalidate {"entity_type": "path", "entity_id": "/", ...}
//!      ↓
//! Redis Pub/Sub (broadcast to all subscribers)
//!      ↓
//! Web frontends / edge caches:
//!   3. Receive invalidation message
//!   4. Re-render the cached page for that path on next access
//! ```
//!
//! # Example
//!
//! ```no_run
//! use cache_invalidation::InvalidationPublisher;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let publisher = InvalidationPublisher::with_channel(
//!         "redis://localhost:6379",
//!         "thread-service".to_string(),
//!         InvalidationPublisher::DEFAULT_CHANNEL.to_string(),
//!     ).await?;
//!
//!     publisher.revalidate_path("/threads").await?;
//!     Ok(())
//! }
//! ```

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

mod error;
pub mod helpers;

pub use error::InvalidationError;
pub use helpers::normalize_path;

type Result<T> = std::result::Result<T, InvalidationError>;

/// `entity_type` carried by path revalidation messages
pub const PATH_ENTITY: &str = "path";

/// Cache invalidation message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationMessage {
    pub message_id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub source_service: String,
}

impl InvalidationMessage {
    /// Create new path revalidation message
    pub fn revalidate(path: String, source_service: String) -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            entity_type: PATH_ENTITY.to_string(),
            entity_id: path,
            timestamp: chrono::Utc::now(),
            source_service,
        }
    }

    /// Cache key this message targets, e.g. `path:/threads`
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.entity_type, self.entity_id)
    }
}

/// Publisher for cache invalidation events
#[derive(Clone)]
pub struct InvalidationPublisher {
    client: ConnectionManager,
    channel: String,
    service_name: String,
}

impl InvalidationPublisher {
    /// Default Redis channel for cache invalidation
    pub const DEFAULT_CHANNEL: &'static str = "cache:invalidate";

    /// Create publisher with custom channel
    pub async fn with_channel(
        redis_url: &str,
        service_name: String,
        channel: String,
    ) -> Result<Self> {
        if channel.trim().is_empty() {
            return Err(InvalidationError::Configuration(
                "invalidation channel must not be empty".to_string(),
            ));
        }

        let client = Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;

        Ok(Self {
            client: connection,
            channel,
            service_name,
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Publish invalidation message
    ///
    /// Returns number of subscribers that received the message
    pub async fn publish(&self, msg: InvalidationMessage) -> Result<usize> {
        let payload = serde_json::to_string(&msg)?;

        debug!(
            message_id = %msg.message_id,
            entity_type = %msg.entity_type,
            channel = %self.channel,
            "Publishing invalidation message"
        );

        let mut conn = self.client.clone();
        let subscriber_count: usize = conn.publish(&self.channel, payload).await?;

        info!(
            message_id = %msg.message_id,
            key = %msg.cache_key(),
            subscribers = subscriber_count,
            "Invalidation message published"
        );

        Ok(subscriber_count)
    }

    /// Ask subscribers to re-render the given path
    pub async fn revalidate_path(&self, path: &str) -> Result<usize> {
        let path = normalize_path(path)?;
        let msg = InvalidationMessage::revalidate(path, self.service_name.clone());
        self.publish(msg).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revalidate_message() {
        let msg = InvalidationMessage::revalidate("/".to_string(), "thread-service".to_string());

        assert_eq!(msg.entity_type, "path");
        assert_eq!(msg.entity_id, "/");
        assert_eq!(msg.source_service, "thread-service");
        assert_eq!(msg.cache_key(), "path:/");
    }

    #[test]
    fn test_revalidate_messages_have_unique_ids() {
        let a = InvalidationMessage::revalidate("/".into(), "svc".into());
        let b = InvalidationMessage::revalidate("/".into(), "svc".into());
        assert_ne!(a.message_id, b.message_id);
    }

    #[test]
    fn test_invalidation_message_wire_format() {
        let msg = InvalidationMessage::revalidate("/thread/42".into(), "thread-service".into());

        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["entity_type"], "path");
        assert_eq!(json["entity_id"], "/thread/42");

        let decoded: InvalidationMessage = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.message_id, msg.message_id);
        assert_eq!(decoded.cache_key(), "path:/thread/42");
    }
}
