/*
 * Responsibility
 * - repo が上位に伝える意味の定義
 * - 意味を持つ DB エラー (email の一意制約違反) はここで変換する
 */
use thiserror::Error;

// Unique constraint violation.
const PG_UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
    #[error("duplicate email")]
    DuplicateEmail,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("password hashing failed")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("blocking task failed")]
    Task(#[from] tokio::task::JoinError),
}

impl RepoError {
    /// Maps a failed `users` insert. The only unique column besides the
    /// primary key is `email`.
    pub fn from_user_insert(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(dbe) = &e
            && dbe.code().as_deref() == Some(PG_UNIQUE_VIOLATION)
        {
            return RepoError::DuplicateEmail;
        }
        RepoError::Db(e)
    }
}
