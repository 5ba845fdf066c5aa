use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::ContentStore;
use crate::error::{AppError, Result};
use crate::models::{Content, ContentKind, User, UserProfile};

const CONTENT_COLUMNS: &str = "id, text, author, parent_id, children, community, created_at";
const USER_COLUMNS: &str =
    "id, external_id, username, name, image, bio, onboarded, threads, posts, created_at";

/// Label used for pool metrics
const SERVICE_NAME: &str = "thread-service";

/// PostgreSQL-backed content store
#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn append_to_author(
        tx: &mut Transaction<'_, Postgres>,
        kind: ContentKind,
        author_id: Uuid,
        content_id: Uuid,
    ) -> Result<()> {
        let sql = format!(
            "UPDATE users SET {col} = array_append({col}, $2) WHERE id = $1",
            col = kind.authored_column()
        );
        let res = sqlx::query(&sql)
            .bind(author_id)
            .bind(content_id)
            .execute(&mut **tx)
            .await?;

        if res.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {}", author_id)));
        }
        Ok(())
    }

    async fn append_to_parent(
        tx: &mut Transaction<'_, Postgres>,
        kind: ContentKind,
        parent_id: Uuid,
        content_id: Uuid,
    ) -> Result<()> {
        let sql = format!(
            "UPDATE {table} SET children = array_append(children, $2) WHERE id = $1",
            table = kind.table()
        );
        let res = sqlx::query(&sql)
            .bind(parent_id)
            .bind(content_id)
            .execute(&mut **tx)
            .await?;

        if res.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} {}", kind, parent_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn insert_content(
        &self,
        kind: ContentKind,
        text: &str,
        author_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<Content> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        // Row locks on the author (and parent) are taken first so a missing
        // reference is reported as NotFound rather than an FK violation.
        Self::append_to_author(&mut tx, kind, author_id, id).await?;
        if let Some(parent_id) = parent_id {
            Self::append_to_parent(&mut tx, kind, parent_id, id).await?;
        }

        let sql = format!(
            "INSERT INTO {table} (id, text, author, parent_id, children, community, created_at) \
             VALUES ($1, $2, $3, $4, '{{}}', NULL, NOW()) \
             RETURNING {CONTENT_COLUMNS}",
            table = kind.table()
        );
        let content = sqlx::query_as::<_, Content>(&sql)
            .bind(id)
            .bind(text)
            .bind(author_id)
            .bind(parent_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(
            kind = %kind,
            content_id = %content.id,
            author_id = %author_id,
            parent_id = ?parent_id,
            "Content inserted"
        );

        Ok(content)
    }

    async fn find_top_level(
        &self,
        kind: ContentKind,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Content>> {
        let sql = format!(
            "SELECT {CONTENT_COLUMNS} FROM {table} \
             WHERE parent_id IS NULL \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1 OFFSET $2",
            table = kind.table()
        );
        let rows = sqlx::query_as::<_, Content>(&sql)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count_top_level(&self, kind: ContentKind) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {table} WHERE parent_id IS NULL",
            table = kind.table()
        );
        let total: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(total)
    }

    async fn find_content(&self, kind: ContentKind, id: Uuid) -> Result<Option<Content>> {
        let sql = format!(
            "SELECT {CONTENT_COLUMNS} FROM {table} WHERE id = $1",
            table = kind.table()
        );
        let row = sqlx::query_as::<_, Content>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_contents(&self, kind: ContentKind, ids: &[Uuid]) -> Result<Vec<Content>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {CONTENT_COLUMNS} FROM {table} WHERE id = ANY($1)",
            table = kind.table()
        );
        let rows = sqlx::query_as::<_, Content>(&sql)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");
        let rows = sqlx::query_as::<_, User>(&sql)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE external_id = $1");
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn upsert_user(&self, profile: &UserProfile) -> Result<User> {
        let sql = format!(
            r#"
            INSERT INTO users (external_id, username, name, image, bio, onboarded)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            ON CONFLICT (external_id) DO UPDATE
            SET username = EXCLUDED.username,
                name = EXCLUDED.name,
                image = EXCLUDED.image,
                bio = EXCLUDED.bio,
                onboarded = TRUE
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&profile.external_id)
            .bind(&profile.username)
            .bind(&profile.name)
            .bind(&profile.image)
            .bind(&profile.bio)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn repair_author_links(&self, kind: ContentKind, limit: i64) -> Result<u64> {
        let sql = format!(
            r#"
            WITH missing AS (
                SELECT c.author, c.id, c.created_at
                FROM {table} c
                JOIN users u ON u.id = c.author
                WHERE NOT (c.id = ANY(u.{col}))
                ORDER BY c.created_at, c.id
                LIMIT $1
            ), grouped AS (
                SELECT author, array_agg(id ORDER BY created_at, id) AS ids
                FROM missing
                GROUP BY author
            )
            UPDATE users u
            SET {col} = u.{col} || g.ids
            FROM grouped g
            WHERE u.id = g.author
            RETURNING cardinality(g.ids)::BIGINT
            "#,
            table = kind.table(),
            col = kind.authored_column()
        );
        let added: Vec<i64> = sqlx::query_scalar(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(added.into_iter().map(|n| n.max(0) as u64).sum())
    }

    async fn repair_parent_links(&self, kind: ContentKind, limit: i64) -> Result<u64> {
        let sql = format!(
            r#"
            WITH missing AS (
                SELECT c.parent_id, c.id, c.created_at
                FROM {table} c
                JOIN {table} p ON p.id = c.parent_id
                WHERE NOT (c.id = ANY(p.children))
                ORDER BY c.created_at, c.id
                LIMIT $1
            ), grouped AS (
                SELECT parent_id, array_agg(id ORDER BY created_at, id) AS ids
                FROM missing
                GROUP BY parent_id
            )
            UPDATE {table} p
            SET children = p.children || g.ids
            FROM grouped g
            WHERE p.id = g.parent_id
            RETURNING cardinality(g.ids)::BIGINT
            "#,
            table = kind.table()
        );
        let added: Vec<i64> = sqlx::query_scalar(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(added.into_iter().map(|n| n.max(0) as u64).sum())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = db_pool::acquire_with_metrics(&self.pool, SERVICE_NAME).await?;
        sqlx::query("SELECT 1").execute(&mut *conn).await?;
        Ok(())
    }
}
