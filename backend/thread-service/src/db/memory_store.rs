//! In-memory `ContentStore` used by tests and local runs without PostgreSQL.
//!
//! All state sits behind one `RwLock`, so every write (including the
//! author and parent appends) is applied atomically with respect to readers.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ContentStore;
use crate::error::{AppError, Result};
use crate::models::{Content, ContentKind, User, UserProfile};

#[derive(Default)]
struct Collection {
    records: HashMap<Uuid, Content>,
    /// Insertion order, used as the tie-break for equal timestamps
    order: Vec<Uuid>,
}

impl Collection {
    fn push(&mut self, content: Content) {
        self.order.push(content.id);
        self.records.insert(content.id, content);
    }
}

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    threads: Collection,
    posts: Collection,
}

impl State {
    fn collection(&self, kind: ContentKind) -> &Collection {
        match kind {
            ContentKind::Thread => &self.threads,
            ContentKind::Post => &self.posts,
        }
    }

    fn collection_mut(&mut self, kind: ContentKind) -> &mut Collection {
        match kind {
            ContentKind::Thread => &mut self.threads,
            ContentKind::Post => &mut self.posts,
        }
    }
}

#[derive(Default)]
pub struct MemoryContentStore {
    state: RwLock<State>,
    unavailable: AtomicBool,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `DatabaseError`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Store a record as-is without touching author or parent references.
    /// Mirrors data written by older clients that never linked it.
    pub async fn import_content(&self, kind: ContentKind, content: Content) {
        let mut state = self.state.write().await;
        state.collection_mut(kind).push(content);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError("store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn insert_content(
        &self,
        kind: ContentKind,
        text: &str,
        author_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<Content> {
        self.check_available()?;
        let mut state = self.state.write().await;

        if !state.users.contains_key(&author_id) {
            return Err(AppError::NotFound(format!("user {}", author_id)));
        }
        if let Some(parent_id) = parent_id {
            if !state.collection(kind).records.contains_key(&parent_id) {
                return Err(AppError::NotFound(format!("{} {}", kind, parent_id)));
            }
        }

        let content = Content {
            id: Uuid::new_v4(),
            text: text.to_string(),
            author: author_id,
            parent_id,
            children: Vec::new(),
            community: None,
            created_at: Utc::now(),
        };

        // Both references were checked above under the same write lock.
        if let Some(author) = state.users.get_mut(&author_id) {
            author.authored_mut(kind).push(content.id);
        }
        if let Some(parent_id) = parent_id {
            if let Some(parent) = state.collection_mut(kind).records.get_mut(&parent_id) {
                parent.children.push(content.id);
            }
        }
        state.collection_mut(kind).push(content.clone());

        Ok(content)
    }

    async fn find_top_level(
        &self,
        kind: ContentKind,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Content>> {
        self.check_available()?;
        let state = self.state.read().await;
        let collection = state.collection(kind);

        let mut top_level: Vec<(usize, &Content)> = collection
            .order
            .iter()
            .enumerate()
            .filter_map(|(pos, id)| collection.records.get(id).map(|c| (pos, c)))
            .filter(|(_, c)| c.is_top_level())
            .collect();
        top_level.sort_by(|(pa, a), (pb, b)| {
            b.created_at.cmp(&a.created_at).then_with(|| pb.cmp(pa))
        });

        Ok(top_level
            .into_iter()
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|(_, c)| c.clone())
            .collect())
    }

    async fn count_top_level(&self, kind: ContentKind) -> Result<i64> {
        self.check_available()?;
        let state = self.state.read().await;
        let total = state
            .collection(kind)
            .records
            .values()
            .filter(|c| c.is_top_level())
            .count();
        Ok(total as i64)
    }

    async fn find_content(&self, kind: ContentKind, id: Uuid) -> Result<Option<Content>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.collection(kind).records.get(&id).cloned())
    }

    async fn find_contents(&self, kind: ContentKind, ids: &[Uuid]) -> Result<Vec<Content>> {
        self.check_available()?;
        let state = self.state.read().await;
        let records = &state.collection(kind).records;
        Ok(ids.iter().filter_map(|id| records.get(id).cloned()).collect())
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.external_id == external_id)
            .cloned())
    }

    async fn upsert_user(&self, profile: &UserProfile) -> Result<User> {
        self.check_available()?;
        let mut state = self.state.write().await;

        let existing = state
            .users
            .values_mut()
            .find(|u| u.external_id == profile.external_id);

        let user = match existing {
            Some(user) => {
                user.username = profile.username.clone();
                user.name = profile.name.clone();
                user.image = profile.image.clone();
                user.bio = profile.bio.clone();
                user.onboarded = true;
                user.clone()
            }
            None => {
                let user = User {
                    id: Uuid::new_v4(),
                    external_id: profile.external_id.clone(),
                    username: profile.username.clone(),
                    name: profile.name.clone(),
                    image: profile.image.clone(),
                    bio: profile.bio.clone(),
                    onboarded: true,
                    threads: Vec::new(),
                    posts: Vec::new(),
                    created_at: Utc::now(),
                };
                state.users.insert(user.id, user.clone());
                user
            }
        };

        Ok(user)
    }

    async fn repair_author_links(&self, kind: ContentKind, limit: i64) -> Result<u64> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let State {
            users,
            threads,
            posts,
        } = &mut *state;
        let collection = match kind {
            ContentKind::Thread => threads,
            ContentKind::Post => posts,
        };

        let mut added = 0u64;
        for id in &collection.order {
            if added >= limit.max(0) as u64 {
                break;
            }
            let Some(content) = collection.records.get(id) else {
                continue;
            };
            let Some(author) = users.get_mut(&content.author) else {
                continue;
            };
            let authored = author.authored_mut(kind);
            if !authored.contains(id) {
                authored.push(*id);
                added += 1;
            }
        }
        Ok(added)
    }

    async fn repair_parent_links(&self, kind: ContentKind, limit: i64) -> Result<u64> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let collection = state.collection_mut(kind);

        let orphans: Vec<(Uuid, Uuid)> = collection
            .order
            .iter()
            .filter_map(|id| collection.records.get(id))
            .filter_map(|c| c.parent_id.map(|parent| (parent, c.id)))
            .filter(|(parent, id)| {
                collection
                    .records
                    .get(parent)
                    .is_some_and(|p| !p.children.contains(id))
            })
            .take(limit.max(0) as usize)
            .collect();

        let mut added = 0u64;
        for (parent_id, id) in orphans {
            if let Some(parent) = collection.records.get_mut(&parent_id) {
                parent.children.push(id);
                added += 1;
            }
        }
        Ok(added)
    }

    async fn ping(&self) -> Result<()> {
        self.check_available()
    }
}
