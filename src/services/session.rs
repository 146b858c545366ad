//! Cookie-backed session state.
//!
//! The whole session (CSRF secret, signed-in user, pending flashes) lives in
//! one private cookie: encrypted and authenticated with a key derived from
//! `SECRET_KEY`. A cookie that fails to decrypt is treated as absent.
//!
//! Handlers never touch the cookie directly. `middleware::session` loads a
//! [`Session`] handle per request and writes it back only when modified.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use thiserror::Error;

use crate::services::csrf::{self, CsrfError};

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Csrf(#[from] CsrfError),
    #[error("session encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionData {
    pub csrf_secret: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub flashes: Vec<String>,
}

impl SessionData {
    pub fn new() -> Result<Self, SessionError> {
        Ok(Self {
            csrf_secret: csrf::generate_secret()?,
            user_id: None,
            flashes: Vec::new(),
        })
    }
}

#[derive(Debug)]
struct Inner {
    data: SessionData,
    modified: bool,
}

/// Request-scoped handle to the session. Clones share state.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<Mutex<Inner>>,
}

impl Session {
    pub fn new(data: SessionData, modified: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner { data, modified })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn user_id(&self) -> Option<i64> {
        self.lock().data.user_id
    }

    pub fn csrf_secret(&self) -> String {
        self.lock().data.csrf_secret.clone()
    }

    pub fn put_flash(&self, message: impl Into<String>) {
        let mut inner = self.lock();
        inner.data.flashes.push(message.into());
        inner.modified = true;
    }

    /// Pops the oldest pending flash.
    pub fn take_flash(&self) -> Option<String> {
        let mut inner = self.lock();
        if inner.data.flashes.is_empty() {
            return None;
        }
        inner.modified = true;
        Some(inner.data.flashes.remove(0))
    }

    /// Marks the session as signed in. The CSRF secret rotates with the
    /// privilege change.
    pub fn login(&self, user_id: i64) -> Result<(), SessionError> {
        let secret = csrf::generate_secret()?;
        let mut inner = self.lock();
        inner.data.user_id = Some(user_id);
        inner.data.csrf_secret = secret;
        inner.modified = true;
        Ok(())
    }

    /// Signs out while keeping pending flashes.
    pub fn logout(&self) -> Result<(), SessionError> {
        let secret = csrf::generate_secret()?;
        let mut inner = self.lock();
        inner.data.user_id = None;
        inner.data.csrf_secret = secret;
        inner.modified = true;
        Ok(())
    }

    pub fn is_modified(&self) -> bool {
        self.lock().modified
    }

    pub fn snapshot(&self) -> SessionData {
        self.lock().data.clone()
    }
}

/// Encodes and decodes sessions to and from the private cookie.
#[derive(Clone)]
pub struct CookieSessionStore {
    key: Key,
    secure: bool,
    lifetime: Duration,
}

impl std::fmt::Debug for CookieSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieSessionStore")
            .field("secure", &self.secure)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl CookieSessionStore {
    pub fn new(secret: &str, secure: bool, lifetime: Duration) -> Self {
        // Key::from needs 64 bytes of key material.
        let digest = Sha512::digest(secret.as_bytes());
        Self {
            key: Key::from(digest.as_slice()),
            secure,
            lifetime,
        }
    }

    /// `None` when the cookie is missing, tampered with, or undecodable.
    pub fn load(&self, headers: &HeaderMap) -> Option<SessionData> {
        let jar = PrivateCookieJar::from_headers(headers, self.key.clone());
        let cookie = jar.get(SESSION_COOKIE)?;

        match serde_json::from_str(cookie.value()) {
            Ok(data) => Some(data),
            Err(err) => {
                tracing::debug!(error = %err, "discarding undecodable session cookie");
                None
            }
        }
    }

    /// Builds a jar whose response parts set the encrypted session cookie.
    pub fn save(&self, data: &SessionData) -> Result<PrivateCookieJar, SessionError> {
        let value = serde_json::to_string(data)?;
        let max_age =
            time::Duration::seconds(i64::try_from(self.lifetime.as_secs()).unwrap_or(i64::MAX));

        let cookie = Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(max_age);

        Ok(PrivateCookieJar::new(self.key.clone()).add(cookie))
    }
}
