/*
 * Responsibility
 * - users テーブル向け SQLx 操作 (signup / 認証 / 存在確認)
 * - パスワードは bcrypt ハッシュのみ保存
 * - bcrypt は CPU バウンドなので blocking pool で実行
 */
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoError;

pub const BCRYPT_COST: u32 = 12;

#[async_trait]
pub trait UserRepo: Send + Sync + 'static {
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), RepoError>;

    /// Returns the user id when `email` and `password` match a stored user.
    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, RepoError>;

    async fn exists(&self, id: i64) -> Result<bool, RepoError>;
}

#[derive(Debug, FromRow)]
struct CredentialRow {
    id: i64,
    hashed_password: String,
}

#[derive(Clone, Debug)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), RepoError> {
        let hashed_password = hash_password(password.to_owned()).await?;

        sqlx::query(
            r#"
            INSERT INTO users (name, email, hashed_password, created)
            VALUES ($1, $2, $3, NOW())
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(hashed_password)
        .execute(&self.pool)
        .await
        .map_err(RepoError::from_user_insert)?;

        Ok(())
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, RepoError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, hashed_password
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepoError::InvalidCredentials)?;

        if verify_password(password.to_owned(), row.hashed_password).await? {
            Ok(row.id)
        } else {
            Err(RepoError::InvalidCredentials)
        }
    }

    async fn exists(&self, id: i64) -> Result<bool, RepoError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT true FROM users WHERE id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

pub async fn hash_password(password: String) -> Result<String, RepoError> {
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST)).await??;
    Ok(hashed)
}

/// A malformed stored hash counts as a mismatch rather than a server error.
pub async fn verify_password(password: String, hashed: String) -> Result<bool, RepoError> {
    let matched = tokio::task::spawn_blocking(move || {
        bcrypt::verify(password, &hashed).unwrap_or(false)
    })
    .await?;
    Ok(matched)
}
