/// Feed reader - paginated listing of top-level content
use std::sync::Arc;
use std::time::Instant;

use super::population::populate;
use crate::db::ContentStore;
use crate::error::Result;
use crate::metrics::content::record_read;
use crate::models::{ContentKind, FeedPage, PageRequest};

/// Replies expanded below each feed item
const FEED_REPLY_DEPTH: usize = 1;

pub struct FeedReader {
    store: Arc<dyn ContentStore>,
    max_page_size: u32,
}

impl FeedReader {
    pub fn new(store: Arc<dyn ContentStore>, max_page_size: u32) -> Self {
        Self {
            store,
            max_page_size: max_page_size.max(1),
        }
    }

    /// List top-level records newest first.
    ///
    /// Each item carries its full author and one level of replies with
    /// reduced authors. Page sizes above the configured maximum are clamped.
    /// Store errors are returned unchanged.
    pub async fn list_top_level(&self, kind: ContentKind, page: PageRequest) -> Result<FeedPage> {
        let start = Instant::now();
        let page = if page.page_size() > self.max_page_size {
            PageRequest::new(page.page(), self.max_page_size)?
        } else {
            page
        };

        let skip = page.skip();
        let roots = self.store.find_top_level(kind, skip, page.limit()).await?;
        let total = self.store.count_top_level(kind).await?;
        let items = populate(self.store.as_ref(), kind, roots, FEED_REPLY_DEPTH).await?;

        let has_more = total > skip + items.len() as i64;

        tracing::debug!(
            kind = %kind,
            page = page.page(),
            page_size = page.page_size(),
            returned = items.len(),
            total,
            has_more,
            "feed page loaded"
        );
        record_read("feed", kind.label(), start.elapsed());

        Ok(FeedPage { items, has_more })
    }
}
