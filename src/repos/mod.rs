pub mod error;
pub mod snippet_repo;
pub mod user_repo;

pub use error::RepoError;
pub use snippet_repo::{PgSnippetRepo, Snippet, SnippetRepo};
pub use user_repo::{PgUserRepo, UserRepo};
