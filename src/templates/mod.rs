//! Page rendering.
//!
//! Every page is an askama template type under `ui/html/pages` extending
//! `base.html`. Handlers build a [`TemplateData`] from the request's session
//! and hand the page to [`render`].

use askama::Template;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use chrono::{DateTime, Datelike, TimeZone, Utc};

use crate::error::AppError;
use crate::repos::Snippet;
use crate::services::{csrf, session::Session};
use crate::web::extractors::CurrentUser;

mod pages;

pub use pages::{CreatePage, HomePage, LoginPage, SignupPage, ViewPage};

/// Request-scoped values every page needs (layout, nav, forms).
#[derive(Debug, Clone)]
pub struct TemplateData {
    pub current_year: i32,
    pub flash: Option<String>,
    pub is_authenticated: bool,
    pub csrf_token: String,
}

impl TemplateData {
    /// Consumes the pending flash message, so build this only when a page is
    /// actually rendered.
    pub fn new(session: &Session, user: Option<&CurrentUser>) -> Result<Self, AppError> {
        let csrf_token = csrf::mask(&session.csrf_secret()).map_err(AppError::internal)?;

        Ok(Self {
            current_year: Utc::now().year(),
            flash: session.take_flash(),
            is_authenticated: user.is_some(),
            csrf_token,
        })
    }
}

/// A renderable page carrying its [`TemplateData`].
pub trait Page: Template {
    fn data(&self) -> &TemplateData;
}

/// Renders into a buffer first; a template error never produces a partial page.
pub fn render<P: Page>(status: StatusCode, page: &P) -> Result<Response, AppError> {
    let html = page.render()?;
    let mut response = (status, Html(html)).into_response();

    if let Ok(token) = HeaderValue::from_str(&page.data().csrf_token) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(csrf::HEADER), token);
    }

    Ok(response)
}

/// `02 Jan 2006 at 15:04`, always in UTC. `None` renders as an empty string.
pub fn human_date<Tz: TimeZone>(t: Option<&DateTime<Tz>>) -> String {
    t.map(|t| t.with_timezone(&Utc).format("%d %b %Y at %H:%M").to_string())
        .unwrap_or_default()
}

impl Snippet {
    pub fn created_display(&self) -> String {
        human_date(Some(&self.created))
    }

    pub fn expires_display(&self) -> String {
        human_date(Some(&self.expires))
    }
}
