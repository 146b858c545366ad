/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - repo は trait 越しに持つ (DB なしで handler をテストできる)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::repos::{SnippetRepo, UserRepo};
use crate::services::session::CookieSessionStore;

#[derive(Clone)]
pub struct AppState {
    pub snippets: Arc<dyn SnippetRepo>,
    pub users: Arc<dyn UserRepo>,
    pub sessions: CookieSessionStore,
}

impl AppState {
    pub fn new(
        snippets: Arc<dyn SnippetRepo>,
        users: Arc<dyn UserRepo>,
        sessions: CookieSessionStore,
    ) -> Self {
        Self {
            snippets,
            users,
            sessions,
        }
    }
}
