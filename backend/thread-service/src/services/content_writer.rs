/// Content writer - creates threads, posts and replies
use std::sync::Arc;

use crate::cache::Revalidator;
use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::metrics::content::{record_created, record_revalidation};
use crate::models::{Content, ContentKind, NewContent};

pub struct ContentWriter {
    store: Arc<dyn ContentStore>,
    revalidator: Arc<dyn Revalidator>,
}

impl ContentWriter {
    pub fn new(store: Arc<dyn ContentStore>, revalidator: Arc<dyn Revalidator>) -> Self {
        Self { store, revalidator }
    }

    /// Create a record and link it to its author (and parent, for replies).
    ///
    /// `community_id` is accepted but never stored. Once the write has
    /// committed, `notify_path` is revalidated; a failed revalidation is
    /// logged and does not fail the call.
    ///
    /// # Errors
    ///
    /// Any failure is returned as `AppError::Persistence` with the context
    /// "Failed to create thread" or "Failed to create post".
    pub async fn create_content(&self, kind: ContentKind, input: NewContent) -> Result<Content> {
        let content = match self.persist(kind, &input).await {
            Ok(content) => content,
            Err(err) => {
                record_created(kind.label(), "error");
                tracing::error!(
                    kind = %kind,
                    author_id = %input.author_id,
                    parent_id = ?input.parent_id,
                    "content creation failed: {}",
                    err
                );
                return Err(AppError::persistence(
                    format!("Failed to create {}", kind),
                    err,
                ));
            }
        };

        record_created(kind.label(), "success");
        tracing::info!(
            kind = %kind,
            content_id = %content.id,
            author_id = %content.author,
            reply = content.parent_id.is_some(),
            "content created"
        );

        match self.revalidator.revalidate(&input.notify_path).await {
            Ok(()) => record_revalidation("success"),
            Err(err) => {
                record_revalidation("error");
                tracing::warn!(
                    path = %input.notify_path,
                    content_id = %content.id,
                    "revalidation failed: {}",
                    err
                );
            }
        }

        Ok(content)
    }

    async fn persist(&self, kind: ContentKind, input: &NewContent) -> Result<Content> {
        if input.text.trim().is_empty() {
            return Err(AppError::ValidationError(
                "text must not be empty".to_string(),
            ));
        }
        if let Some(community_id) = input.community_id {
            tracing::debug!(%community_id, "community scoping not supported; ignoring");
        }

        self.store
            .insert_content(kind, &input.text, input.author_id, input.parent_id)
            .await
    }
}
