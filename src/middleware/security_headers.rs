//! Security-related response headers for browser clients.
//!
//! Applied once at the Router level, outside the session/auth/CSRF layers so
//! that rejections and redirects carry the same headers as rendered pages.
//!
//! Responsibility:
//! - Content Security Policy (same-origin scripts and styles only)
//! - Clickjacking protection
//! - MIME sniffing protection
//! - Referrer leakage control

use axum::Router;
use axum::http::header::{HeaderName, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;

pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; style-src 'self'";

/// Apply common security headers to all responses.
pub fn apply(router: Router) -> Router {
    router
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("content-security-policy"),
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        // Clickjacking protection
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("deny"),
        ))
        // Prevent MIME sniffing
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        // Full URL for same-origin requests, origin only for cross-origin ones
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("origin-when-cross-origin"),
        ))
        // The legacy XSS auditor does more harm than good; CSP replaces it.
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("x-xss-protection"),
            HeaderValue::from_static("0"),
        ))
}
