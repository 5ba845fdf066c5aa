//! Integration tests for cache invalidation library
//!
//! These tests require a running Redis instance.
//! Run with: cargo test --test integration_test -- --ignored

use cache_invalidation::{InvalidationMessage, InvalidationPublisher};
use futures_util::StreamExt;
use std::time::Duration;

const REDIS_URL: &str = "redis://127.0.0.1:6379";

#[tokio::test]
#[ignore = "Requires Redis server"]
async fn test_revalidate_path_reaches_subscriber() {
    let channel = format!("cache:invalidate:test:{}", uuid::Uuid::new_v4());

    let client = redis::Client::open(REDIS_URL).expect("invalid redis url");
    let mut pubsub = client
        .get_async_pubsub()
        .await
        .expect("Failed to open pubsub connection");
    pubsub.subscribe(&channel).await.expect("Failed to subscribe");

    let publisher =
        InvalidationPublisher::with_channel(REDIS_URL, "test-service".to_string(), channel)
            .await
            .expect("Failed to create publisher");

    let delivered = publisher
        .revalidate_path("threads/")
        .await
        .expect("Failed to publish");
    assert_eq!(delivered, 1);

    let mut stream = pubsub.on_message();
    let msg = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("timed out waiting for message")
        .expect("pubsub stream closed");

    let payload: String = msg.get_payload().expect("payload not a string");
    let decoded: InvalidationMessage = serde_json::from_str(&payload).expect("bad payload");

    assert_eq!(decoded.entity_type, "path");
    assert_eq!(decoded.entity_id, "/threads");
    assert_eq!(decoded.source_service, "test-service");
}

#[tokio::test]
#[ignore = "Requires Redis server"]
async fn test_publish_without_subscribers_returns_zero() {
    let channel = format!("cache:invalidate:empty:{}", uuid::Uuid::new_v4());
    let publisher =
        InvalidationPublisher::with_channel(REDIS_URL, "test-service".to_string(), channel)
            .await
            .expect("Failed to create publisher");

    let delivered = publisher
        .revalidate_path("/thread/abc")
        .await
        .expect("Failed to publish");
    assert_eq!(delivered, 0);
}

#[tokio::test]
async fn test_empty_channel_is_rejected() {
    let result =
        InvalidationPublisher::with_channel(REDIS_URL, "test-service".to_string(), " ".to_string())
            .await;
    assert!(result.is_err());
}
