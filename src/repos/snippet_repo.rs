/*
 * Responsibility
 * - snippets テーブル向け SQLx 操作 (insert / get / latest)
 * - 期限切れの行はどの読み出しからも見えない
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoError;

/// Number of snippets shown on the home page.
pub const LATEST_LIMIT: i64 = 10;

#[derive(Debug, Clone, FromRow)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

#[async_trait]
pub trait SnippetRepo: Send + Sync + 'static {
    /// Inserts a snippet expiring `expires_days` from now and returns its id.
    async fn insert(&self, title: &str, content: &str, expires_days: i32)
    -> Result<i64, RepoError>;

    /// `None` when the snippet does not exist or has expired.
    async fn get(&self, id: i64) -> Result<Option<Snippet>, RepoError>;

    async fn latest(&self) -> Result<Vec<Snippet>, RepoError>;
}

#[derive(Clone, Debug)]
pub struct PgSnippetRepo {
    pool: PgPool,
}

impl PgSnippetRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnippetRepo for PgSnippetRepo {
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_days: i32,
    ) -> Result<i64, RepoError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO snippets (title, content, created, expires)
            VALUES ($1, $2, NOW(), NOW() + make_interval(days => $3))
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(expires_days)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Option<Snippet>, RepoError> {
        let row = sqlx::query_as::<_, Snippet>(
            r#"
            SELECT id, title, content, created, expires
            FROM snippets
            WHERE expires > NOW() AND id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn latest(&self) -> Result<Vec<Snippet>, RepoError> {
        let rows = sqlx::query_as::<_, Snippet>(
            r#"
            SELECT id, title, content, created, expires
            FROM snippets
            WHERE expires > NOW()
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(LATEST_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
