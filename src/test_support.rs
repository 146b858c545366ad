//! In-memory repositories and a cookie-aware client for router tests.
//!
//! `TestClient` drives the fully layered router with `oneshot`, so every test
//! goes through the same session / auth / CSRF chain as production traffic.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
    response::IntoResponse,
};
use chrono::{TimeDelta, Utc};
use regex::Regex;
use tower::ServiceExt;

use crate::{
    app::build_router,
    config::{AppEnv, Config},
    repos::{RepoError, Snippet, SnippetRepo, UserRepo},
    services::session::{CookieSessionStore, SESSION_COOKIE, SessionData},
    state::AppState,
};

pub const MOCK_USER_ID: i64 = 1;
pub const MOCK_EMAIL: &str = "alice@example.com";
pub const MOCK_PASSWORD: &str = "pa$$word";
pub const DUPLICATE_EMAIL: &str = "dupe@example.com";

fn mock_snippet() -> Snippet {
    Snippet {
        id: 1,
        title: "An old silent pond".to_string(),
        content: "An old silent pond...".to_string(),
        created: Utc::now() - TimeDelta::hours(1),
        expires: Utc::now() + TimeDelta::days(365),
    }
}

pub struct MockSnippetRepo;

#[async_trait]
impl SnippetRepo for MockSnippetRepo {
    async fn insert(&self, _title: &str, _content: &str, _days: i32) -> Result<i64, RepoError> {
        Ok(2)
    }

    async fn get(&self, id: i64) -> Result<Option<Snippet>, RepoError> {
        Ok((id == 1).then(mock_snippet))
    }

    async fn latest(&self) -> Result<Vec<Snippet>, RepoError> {
        Ok(vec![mock_snippet()])
    }
}

pub struct MockUserRepo;

#[async_trait]
impl UserRepo for MockUserRepo {
    async fn insert(&self, _name: &str, email: &str, _password: &str) -> Result<(), RepoError> {
        if email == DUPLICATE_EMAIL {
            return Err(RepoError::DuplicateEmail);
        }
        Ok(())
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, RepoError> {
        if email == MOCK_EMAIL && password == MOCK_PASSWORD {
            return Ok(MOCK_USER_ID);
        }
        Err(RepoError::InvalidCredentials)
    }

    async fn exists(&self, id: i64) -> Result<bool, RepoError> {
        Ok(id == MOCK_USER_ID)
    }
}

fn db_down() -> RepoError {
    RepoError::Db(sqlx::Error::PoolTimedOut)
}

/// Every call fails as if the database were unreachable.
pub struct FailingSnippetRepo;

#[async_trait]
impl SnippetRepo for FailingSnippetRepo {
    async fn insert(&self, _title: &str, _content: &str, _days: i32) -> Result<i64, RepoError> {
        Err(db_down())
    }

    async fn get(&self, _id: i64) -> Result<Option<Snippet>, RepoError> {
        Err(db_down())
    }

    async fn latest(&self) -> Result<Vec<Snippet>, RepoError> {
        Err(db_down())
    }
}

/// Every call fails as if the database were unreachable.
pub struct FailingUserRepo;

#[async_trait]
impl UserRepo for FailingUserRepo {
    async fn insert(&self, _name: &str, _email: &str, _password: &str) -> Result<(), RepoError> {
        Err(db_down())
    }

    async fn authenticate(&self, _email: &str, _password: &str) -> Result<i64, RepoError> {
        Err(db_down())
    }

    async fn exists(&self, _id: i64) -> Result<bool, RepoError> {
        Err(db_down())
    }
}

pub fn test_config() -> Config {
    Config {
        addr: ([127, 0, 0, 1], 0).into(),
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        app_env: AppEnv::Development,
        secret_key: "test-secret-key-that-is-long-enough-0123456789".to_string(),
        session_lifetime: Duration::from_secs(12 * 60 * 60),
        static_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("ui/static"),
    }
}

fn test_store(config: &Config) -> CookieSessionStore {
    CookieSessionStore::new(&config.secret_key, false, config.session_lifetime)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Keeps cookies between requests like a browser would.
pub struct TestClient {
    router: Router,
    store: CookieSessionStore,
    cookies: HashMap<String, String>,
}

impl TestClient {
    pub fn new() -> Self {
        Self::with_repos(Arc::new(MockSnippetRepo), Arc::new(MockUserRepo))
    }

    pub fn with_repos(snippets: Arc<dyn SnippetRepo>, users: Arc<dyn UserRepo>) -> Self {
        let config = test_config();
        let state = AppState::new(snippets, users, test_store(&config));

        Self {
            router: build_router(state, &config),
            store: test_store(&config),
            cookies: HashMap::new(),
        }
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    /// Installs a valid encrypted session cookie, bypassing the login flow.
    pub fn install_session(&mut self, user_id: Option<i64>) {
        let mut data = SessionData::new().unwrap();
        data.user_id = user_id;

        let response = self.store.save(&data).unwrap().into_response();
        for value in response.headers().get_all(header::SET_COOKIE) {
            self.remember(value.to_str().unwrap());
        }
        assert!(self.cookies.contains_key(SESSION_COOKIE));
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        let req = self.request("GET", path).body(Body::empty()).unwrap();
        self.send(req).await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let req = self
            .request("POST", path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(serde_urlencoded::to_string(fields).unwrap()))
            .unwrap();
        self.send(req).await
    }

    pub async fn post_form_with_header(
        &mut self,
        path: &str,
        fields: &[(&str, &str)],
        (name, value): (&str, &str),
    ) -> TestResponse {
        let req = self
            .request("POST", path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(name, value)
            .body(Body::from(serde_urlencoded::to_string(fields).unwrap()))
            .unwrap();
        self.send(req).await
    }

    /// Signs in as the mock user through the real login form.
    pub async fn login(&mut self) {
        let token = extract_csrf_token(&self.get("/user/login").await.body);
        let res = self
            .post_form(
                "/user/login",
                &[
                    ("email", MOCK_EMAIL),
                    ("password", MOCK_PASSWORD),
                    ("csrf_token", token.as_str()),
                ],
            )
            .await;
        assert_eq!(res.status, StatusCode::SEE_OTHER, "login failed");
    }

    fn request(&self, method: &str, path: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(path);
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
    }

    async fn send(&mut self, req: Request<Body>) -> TestResponse {
        let res = self.router.clone().oneshot(req).await.unwrap();

        for value in res.headers().get_all(header::SET_COOKIE) {
            self.remember(value.to_str().unwrap());
        }

        let status = res.status();
        let headers = res.headers().clone();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    fn remember(&mut self, set_cookie: &str) {
        let mut attrs = set_cookie.split(';').map(str::trim);
        let Some((name, value)) = attrs.next().and_then(|pair| pair.split_once('=')) else {
            return;
        };

        if attrs.any(|a| a.eq_ignore_ascii_case("max-age=0")) {
            self.cookies.remove(name);
        } else {
            self.cookies.insert(name.to_string(), value.to_string());
        }
    }
}

static CSRF_INPUT_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<input type='hidden' name='csrf_token' value='([^']+)'>").unwrap()
});

/// Pulls the masked CSRF token out of a rendered form.
pub fn extract_csrf_token(body: &str) -> String {
    CSRF_INPUT_RX
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .expect("no csrf token in body")
}
