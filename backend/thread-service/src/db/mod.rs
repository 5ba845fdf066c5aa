/// Database access layer
///
/// `ContentStore` abstracts the two parallel content collections and the user
/// directory so services can run against PostgreSQL or the in-memory store.
use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Content, ContentKind, User, UserProfile};

pub mod memory_store;
pub mod pg_store;

pub use memory_store::MemoryContentStore;
pub use pg_store::PgContentStore;

/// Persistence operations shared by threads and posts.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Insert a record and link it into its author's authored list and, for
    /// replies, the parent's `children`. The three writes commit together or
    /// not at all.
    ///
    /// # Errors
    ///
    /// `AppError::NotFound` if the author or parent does not exist.
    async fn insert_content(
        &self,
        kind: ContentKind,
        text: &str,
        author_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<Content>;

    /// Top-level records, newest first, ties broken by id descending.
    async fn find_top_level(&self, kind: ContentKind, skip: i64, limit: i64)
        -> Result<Vec<Content>>;

    async fn count_top_level(&self, kind: ContentKind) -> Result<i64>;

    async fn find_content(&self, kind: ContentKind, id: Uuid) -> Result<Option<Content>>;

    /// Records with the given ids. Unknown ids are silently absent from the
    /// result and no ordering is guaranteed.
    async fn find_contents(&self, kind: ContentKind, ids: &[Uuid]) -> Result<Vec<Content>>;

    /// Users with the given ids. Same contract as `find_contents`.
    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<User>>;

    /// Create or update the profile for `external_id` and mark it onboarded.
    async fn upsert_user(&self, profile: &UserProfile) -> Result<User>;

    /// Append records missing from their author's authored list.
    /// Returns the number of references added.
    async fn repair_author_links(&self, kind: ContentKind, limit: i64) -> Result<u64>;

    /// Append replies missing from their parent's `children`.
    /// Returns the number of references added.
    async fn repair_parent_links(&self, kind: ContentKind, limit: i64) -> Result<u64>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<()>;
}
