/// Data models for thread-service
///
/// - `ContentKind`: selects one of the two parallel collections (threads, posts)
/// - `User`: a user record with its authored-content references
/// - `Content`: a stored thread or post, top-level or reply
/// - `ExpandedContent` / `Reply`: content with author and reply references resolved
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Which collection a piece of content lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Thread,
    Post,
}

impl ContentKind {
    pub const ALL: [ContentKind; 2] = [ContentKind::Thread, ContentKind::Post];

    /// Table holding records of this kind.
    pub fn table(self) -> &'static str {
        match self {
            ContentKind::Thread => "threads",
            ContentKind::Post => "posts",
        }
    }

    /// Column on `users` that lists authored records of this kind.
    pub fn authored_column(self) -> &'static str {
        match self {
            ContentKind::Thread => "threads",
            ContentKind::Post => "posts",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ContentKind::Thread => "thread",
            ContentKind::Post => "post",
        }
    }

    /// Parse the plural URL segment (`threads` / `posts`).
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "threads" => Some(ContentKind::Thread),
            "posts" => Some(ContentKind::Post),
            _ => None,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// User record as stored in the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub external_id: String,
    pub username: String,
    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub onboarded: bool,
    /// Authored threads, in creation order
    pub threads: Vec<Uuid>,
    /// Authored posts, in creation order
    pub posts: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn authored(&self, kind: ContentKind) -> &[Uuid] {
        match kind {
            ContentKind::Thread => &self.threads,
            ContentKind::Post => &self.posts,
        }
    }

    pub(crate) fn authored_mut(&mut self, kind: ContentKind) -> &mut Vec<Uuid> {
        match kind {
            ContentKind::Thread => &mut self.threads,
            ContentKind::Post => &mut self.posts,
        }
    }

    pub fn summary(&self) -> AuthorSummary {
        AuthorSummary {
            id: self.id,
            name: self.name.clone(),
            image: self.image.clone(),
        }
    }
}

/// Reduced author projection used on replies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
}

/// Profile fields written during onboarding, keyed by the identity provider id
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub external_id: String,
    pub username: String,
    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
}

/// A stored thread or post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Content {
    pub id: Uuid,
    pub text: String,
    pub author: Uuid,
    pub parent_id: Option<Uuid>,
    /// Direct replies, in the order they were attached
    pub children: Vec<Uuid>,
    /// Always `None` when written by this service
    pub community: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Content {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Input to the content writer
#[derive(Debug, Clone)]
pub struct NewContent {
    pub text: String,
    pub author_id: Uuid,
    /// Accepted for forward compatibility; never persisted
    pub community_id: Option<Uuid>,
    /// Set when the new record is a reply
    pub parent_id: Option<Uuid>,
    /// Location to revalidate once the write is durable
    pub notify_path: String,
}

/// Offset pagination request. Both fields are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    pub const DEFAULT_PAGE_SIZE: u32 = 20;

    pub fn new(page: u32, page_size: u32) -> Result<Self> {
        if page == 0 {
            return Err(AppError::ValidationError(
                "page must be at least 1".to_string(),
            ));
        }
        if page_size == 0 {
            return Err(AppError::ValidationError(
                "page_size must be at least 1".to_string(),
            ));
        }
        // The end offset of the page must stay addressable as an i64.
        if i64::from(page)
            .checked_mul(i64::from(page_size))
            .is_none()
        {
            return Err(AppError::ValidationError(format!(
                "page {} of size {} is out of range",
                page, page_size
            )));
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of records preceding this page
    pub fn skip(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

/// A reply with its author reduced to a summary.
///
/// `children` always lists the reply ids; `replies` holds the expanded ones
/// and is empty past the reader's expansion depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: Uuid,
    pub text: String,
    pub author: AuthorSummary,
    pub parent_id: Option<Uuid>,
    pub community: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub children: Vec<Uuid>,
    pub replies: Vec<Reply>,
}

/// Top-level view of a record with its author fully resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandedContent {
    pub id: Uuid,
    pub text: String,
    pub author: User,
    pub parent_id: Option<Uuid>,
    pub community: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub children: Vec<Uuid>,
    pub replies: Vec<Reply>,
}

/// One page of the top-level feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPage {
    pub items: Vec<ExpandedContent>,
    pub has_more: bool,
}
