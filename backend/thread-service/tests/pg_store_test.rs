//! PostgreSQL store tests.
//!
//! Run with a disposable database:
//! `DATABASE_URL=postgres://... cargo test -p thread-service --test pg_store_test -- --ignored`

use std::collections::HashSet;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thread_service::db::{ContentStore, PgContentStore};
use thread_service::models::{ContentKind, User, UserProfile};
use thread_service::{AppError, MIGRATOR};
use uuid::Uuid;

async fn setup() -> PgContentStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool: PgPool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await
        .expect("connect");
    MIGRATOR.run(&pool).await.expect("migrate");
    PgContentStore::new(pool)
}

async fn onboard(store: &PgContentStore) -> User {
    let tag = Uuid::new_v4().simple().to_string();
    store
        .upsert_user(&UserProfile {
            external_id: format!("idp|{}", tag),
            username: format!("user_{}", &tag[..8]),
            name: "Test User".to_string(),
            image: None,
            bio: None,
        })
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_insert_links_author_and_parent() {
    let store = setup().await;
    let user = onboard(&store).await;

    let root = store
        .insert_content(ContentKind::Thread, "root", user.id, None)
        .await
        .unwrap();
    let reply = store
        .insert_content(ContentKind::Thread, "reply", user.id, Some(root.id))
        .await
        .unwrap();

    let root = store
        .find_content(ContentKind::Thread, root.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(root.children, vec![reply.id]);
    assert!(root.community.is_none());

    let user = store.find_user(user.id).await.unwrap().unwrap();
    assert_eq!(user.threads, vec![root.id, reply.id]);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_missing_parent_rolls_back() {
    let store = setup().await;
    let user = onboard(&store).await;

    let err = store
        .insert_content(ContentKind::Post, "orphan", user.id, Some(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let user = store.find_user(user.id).await.unwrap().unwrap();
    assert!(user.posts.is_empty());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_missing_author_is_not_found() {
    let store = setup().await;
    let err = store
        .insert_content(ContentKind::Post, "ghost", Uuid::new_v4(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_concurrent_inserts_keep_every_append() {
    let store = Arc::new(setup().await);
    let user = onboard(&store).await;

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .insert_content(ContentKind::Post, &format!("c{}", i), user.id, None)
                .await
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap().unwrap().id);
    }

    let user = store.find_user(user.id).await.unwrap().unwrap();
    let linked: HashSet<Uuid> = user.posts.iter().copied().collect();
    assert_eq!(user.posts.len(), 16);
    assert_eq!(linked, ids);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_top_level_ordering_and_count() {
    let store = setup().await;
    let user = onboard(&store).await;

    let before = store.count_top_level(ContentKind::Thread).await.unwrap();
    let older = store
        .insert_content(ContentKind::Thread, "older", user.id, None)
        .await
        .unwrap();
    let newer = store
        .insert_content(ContentKind::Thread, "newer", user.id, None)
        .await
        .unwrap();
    store
        .insert_content(ContentKind::Thread, "reply", user.id, Some(older.id))
        .await
        .unwrap();

    assert_eq!(
        store.count_top_level(ContentKind::Thread).await.unwrap(),
        before + 2
    );

    let top = store
        .find_top_level(ContentKind::Thread, 0, 1000)
        .await
        .unwrap();
    assert!(top.iter().all(|c| c.parent_id.is_none()));
    for pair in top.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }
    let newer_pos = top.iter().position(|c| c.id == newer.id).unwrap();
    let older_pos = top.iter().position(|c| c.id == older.id).unwrap();
    assert!(newer_pos < older_pos);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_repair_relinks_unlinked_rows() {
    let store = setup().await;
    let user = onboard(&store).await;
    let parent = store
        .insert_content(ContentKind::Post, "parent", user.id, None)
        .await
        .unwrap();

    // Simulate a row written without its back-references.
    let legacy_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO posts (id, text, author, parent_id) VALUES ($1, 'legacy', $2, $3)",
    )
    .bind(legacy_id)
    .bind(user.id)
    .bind(parent.id)
    .execute(store.pool())
    .await
    .unwrap();

    assert!(store.repair_author_links(ContentKind::Post, 10_000).await.unwrap() >= 1);
    assert!(store.repair_parent_links(ContentKind::Post, 10_000).await.unwrap() >= 1);

    let user = store.find_user(user.id).await.unwrap().unwrap();
    assert_eq!(user.posts, vec![parent.id, legacy_id]);
    let parent = store
        .find_content(ContentKind::Post, parent.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(parent.children, vec![legacy_id]);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_ping() {
    let store = setup().await;
    store.ping().await.unwrap();
}
