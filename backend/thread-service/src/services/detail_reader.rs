/// Detail reader - one record with two levels of replies
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use super::population::populate;
use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::metrics::content::record_read;
use crate::models::{ContentKind, ExpandedContent};

const DETAIL_REPLY_DEPTH: usize = 2;

pub struct DetailReader {
    store: Arc<dyn ContentStore>,
}

impl DetailReader {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Fetch a record by id with its author, replies and replies of replies.
    ///
    /// Returns `Ok(None)` when the id does not resolve. Failures are wrapped
    /// as "Error fetching thread" / "Error fetching post".
    pub async fn get_content_by_id(
        &self,
        kind: ContentKind,
        id: Uuid,
    ) -> Result<Option<ExpandedContent>> {
        let start = Instant::now();
        let result = self.load(kind, id).await;
        record_read("detail", kind.label(), start.elapsed());

        result.map_err(|err| {
            tracing::error!(kind = %kind, content_id = %id, "detail read failed: {}", err);
            AppError::persistence(format!("Error fetching {}", kind), err)
        })
    }

    async fn load(&self, kind: ContentKind, id: Uuid) -> Result<Option<ExpandedContent>> {
        let Some(root) = self.store.find_content(kind, id).await? else {
            return Ok(None);
        };

        let mut expanded = populate(self.store.as_ref(), kind, vec![root], DETAIL_REPLY_DEPTH).await?;
        Ok(expanded.pop())
    }
}
