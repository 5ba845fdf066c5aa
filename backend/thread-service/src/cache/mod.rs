/// Cache revalidation
///
/// After a write commits, the rendered views that include it (the feed page,
/// the parent's detail page) must be re-rendered. `Revalidator` is the seam;
/// production publishes over Redis pub/sub through `cache-invalidation`.
use async_trait::async_trait;
use cache_invalidation::InvalidationPublisher;
use std::sync::Mutex;

use crate::error::{AppError, Result};

#[async_trait]
pub trait Revalidator: Send + Sync {
    /// Signal that cached renderings of `path` are stale.
    async fn revalidate(&self, path: &str) -> Result<()>;
}

#[async_trait]
impl Revalidator for InvalidationPublisher {
    async fn revalidate(&self, path: &str) -> Result<()> {
        let subscribers = self
            .revalidate_path(path)
            .await
            .map_err(|e| AppError::CacheError(e.to_string()))?;

        if subscribers == 0 {
            tracing::debug!(%path, "revalidation published with no subscribers");
        }
        Ok(())
    }
}

/// Used when no Redis URL is configured.
pub struct NoopRevalidator;

#[async_trait]
impl Revalidator for NoopRevalidator {
    async fn revalidate(&self, path: &str) -> Result<()> {
        tracing::trace!(%path, "revalidation disabled");
        Ok(())
    }
}

/// Keeps every requested path in memory. Optionally fails each call after
/// recording it.
#[derive(Default)]
pub struct RecordingRevalidator {
    paths: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingRevalidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            paths: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Revalidator for RecordingRevalidator {
    async fn revalidate(&self, path: &str) -> Result<()> {
        if let Ok(mut paths) = self.paths.lock() {
            paths.push(path.to_string());
        }
        if self.fail {
            return Err(AppError::CacheError("revalidation unavailable".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_revalidator() {
        let recorder = RecordingRevalidator::new();
        recorder.revalidate("/").await.unwrap();
        recorder.revalidate("/thread/1").await.unwrap();
        assert_eq!(recorder.paths(), vec!["/", "/thread/1"]);
    }

    #[tokio::test]
    async fn test_failing_revalidator_still_records() {
        let recorder = RecordingRevalidator::failing();
        assert!(matches!(
            recorder.revalidate("/").await,
            Err(AppError::CacheError(_))
        ));
        assert_eq!(recorder.paths().len(), 1);
    }
}
