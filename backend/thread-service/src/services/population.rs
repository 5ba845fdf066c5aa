//! Reference expansion shared by the feed and detail readers.
//!
//! Roots get their full author record. Replies are expanded level by level
//! up to `reply_depth`, each with a reduced author. Every level costs one
//! content query plus one user query for the whole batch.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::models::{AuthorSummary, Content, ContentKind, ExpandedContent, Reply, User};

/// Expand `roots` in order. `reply_depth` is the number of reply levels
/// resolved below each root; replies at the last level keep their `children`
/// ids but have no `replies`.
pub async fn populate(
    store: &dyn ContentStore,
    kind: ContentKind,
    roots: Vec<Content>,
    reply_depth: usize,
) -> Result<Vec<ExpandedContent>> {
    if roots.is_empty() {
        return Ok(Vec::new());
    }

    let authors = load_users(store, roots.iter().map(|c| c.author)).await?;

    let mut levels: Vec<HashMap<Uuid, Content>> = Vec::with_capacity(reply_depth);
    let mut frontier: Vec<Uuid> = unique(roots.iter().flat_map(|c| c.children.iter().copied()));
    for _ in 0..reply_depth {
        if frontier.is_empty() {
            break;
        }
        let fetched = store.find_contents(kind, &frontier).await?;
        frontier = unique(fetched.iter().flat_map(|c| c.children.iter().copied()));
        levels.push(fetched.into_iter().map(|c| (c.id, c)).collect());
    }

    let reply_authors: HashMap<Uuid, AuthorSummary> = load_users(
        store,
        levels.iter().flat_map(|level| level.values().map(|c| c.author)),
    )
    .await?
    .into_values()
    .map(|u| (u.id, u.summary()))
    .collect();

    roots
        .into_iter()
        .map(|root| -> Result<ExpandedContent> {
            let author = authors
                .get(&root.author)
                .cloned()
                .ok_or_else(|| dangling_author(&root))?;
            let replies = build_replies(&root.children, &levels, 0, &reply_authors)?;

            Ok(ExpandedContent {
                id: root.id,
                text: root.text,
                author,
                parent_id: root.parent_id,
                community: root.community,
                created_at: root.created_at,
                children: root.children,
                replies,
            })
        })
        .collect()
}

/// Replies for `ids` at `depth`, in `ids` order. Ids that did not resolve
/// are skipped.
fn build_replies(
    ids: &[Uuid],
    levels: &[HashMap<Uuid, Content>],
    depth: usize,
    authors: &HashMap<Uuid, AuthorSummary>,
) -> Result<Vec<Reply>> {
    let Some(level) = levels.get(depth) else {
        return Ok(Vec::new());
    };

    ids.iter()
        .filter_map(|id| level.get(id))
        .map(|content| -> Result<Reply> {
            let author = authors
                .get(&content.author)
                .cloned()
                .ok_or_else(|| dangling_author(content))?;

            Ok(Reply {
                id: content.id,
                text: content.text.clone(),
                author,
                parent_id: content.parent_id,
                community: content.community,
                created_at: content.created_at,
                children: content.children.clone(),
                replies: build_replies(&content.children, levels, depth + 1, authors)?,
            })
        })
        .collect()
}

async fn load_users(
    store: &dyn ContentStore,
    ids: impl Iterator<Item = Uuid>,
) -> Result<HashMap<Uuid, User>> {
    let ids = unique(ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let users = store.find_users(&ids).await?;
    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}

fn unique(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}

fn dangling_author(content: &Content) -> AppError {
    AppError::Internal(format!(
        "content {} references missing author {}",
        content.id, content.author
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryContentStore;
    use crate::models::UserProfile;

    async fn user(store: &MemoryContentStore, name: &str) -> User {
        store
            .upsert_user(&UserProfile {
                external_id: format!("ext-{}", name),
                username: name.to_string(),
                name: name.to_string(),
                image: Some(format!("https://img.example.com/{}.png", name)),
                bio: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_depth_limits_expansion() {
        let store = MemoryContentStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;

        let kind = ContentKind::Thread;
        let root = store.insert_content(kind, "root", alice.id, None).await.unwrap();
        let reply = store
            .insert_content(kind, "reply", bob.id, Some(root.id))
            .await
            .unwrap();
        let nested = store
            .insert_content(kind, "nested", alice.id, Some(reply.id))
            .await
            .unwrap();

        let root = store.find_content(kind, root.id).await.unwrap().unwrap();

        let shallow = populate(&store, kind, vec![root.clone()], 1).await.unwrap();
        assert_eq!(shallow[0].replies.len(), 1);
        assert_eq!(shallow[0].replies[0].author.name, "bob");
        assert_eq!(shallow[0].replies[0].children, vec![nested.id]);
        assert!(shallow[0].replies[0].replies.is_empty());

        let deep = populate(&store, kind, vec![root], 2).await.unwrap();
        assert_eq!(deep[0].author.id, alice.id);
        let second = &deep[0].replies[0].replies;
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, nested.id);
        assert_eq!(second[0].author, alice.summary());
    }

    #[tokio::test]
    async fn test_dangling_children_are_skipped() {
        let store = MemoryContentStore::new();
        let alice = user(&store, "alice").await;
        let mut root = store
            .insert_content(ContentKind::Post, "root", alice.id, None)
            .await
            .unwrap();
        root.children.push(Uuid::new_v4());

        let expanded = populate(&store, ContentKind::Post, vec![root], 1)
            .await
            .unwrap();
        assert_eq!(expanded[0].children.len(), 1);
        assert!(expanded[0].replies.is_empty());
    }

    #[tokio::test]
    async fn test_missing_author_is_internal_error() {
        let store = MemoryContentStore::new();
        let orphan = Content {
            id: Uuid::new_v4(),
            text: "orphan".to_string(),
            author: Uuid::new_v4(),
            parent_id: None,
            children: Vec::new(),
            community: None,
            created_at: chrono::Utc::now(),
        };

        let err = populate(&store, ContentKind::Thread, vec![orphan], 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
