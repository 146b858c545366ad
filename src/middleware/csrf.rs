//! CSRF validation for state-changing requests.
//!
//! The submitted token comes from the `X-CSRF-Token` header or, for
//! urlencoded forms, the `csrf_token` field. Reading the field means buffering
//! the body; the buffered bytes are handed to the inner service unchanged.

use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, header},
    middleware::{self, Next},
    response::Response,
};
use http_body_util::LengthLimitError;

use crate::error::AppError;
use crate::middleware::http::BODY_LIMIT;
use crate::services::csrf;
use crate::services::session::Session;
use crate::state::AppState;

pub fn apply(router: Router<AppState>) -> Router<AppState> {
    router.layer(middleware::from_fn(protect))
}

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

fn is_urlencoded_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"))
}

fn form_token(body: &Bytes) -> Option<String> {
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)
        .ok()?
        .into_iter()
        .find(|(k, _)| k == csrf::FORM_FIELD)
        .map(|(_, v)| v)
}

/// The limit may be hit here or in `RequestBodyLimitLayer`; either way the
/// `LengthLimitError` sits somewhere in the source chain.
fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

async fn submitted_token(
    req: Request<Body>,
) -> Result<(Request<Body>, Option<String>), AppError> {
    let from_header = req
        .headers()
        .get(csrf::HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    if from_header.is_some() || !is_urlencoded_form(req.headers()) {
        return Ok((req, from_header));
    }

    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, BODY_LIMIT)
        .await
        .map_err(|err| {
            if is_length_limit(&err) {
                AppError::PayloadTooLarge
            } else {
                tracing::debug!(error = %err, "failed to read form body");
                AppError::BadRequest
            }
        })?;
    let token = form_token(&bytes);

    Ok((Request::from_parts(parts, Body::from(bytes)), token))
}

async fn protect(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    if is_safe(req.method()) {
        return Ok(next.run(req).await);
    }

    let secret = req
        .extensions()
        .get::<Session>()
        .map(Session::csrf_secret)
        .ok_or_else(|| AppError::internal(anyhow::anyhow!("no session in request extensions")))?;

    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let (req, token) = submitted_token(req).await?;

    match token {
        Some(token) if csrf::verify(&secret, &token) => Ok(next.run(req).await),
        _ => {
            tracing::warn!(%method, %path, "CSRF validation failed");
            Err(AppError::CsrfRejected)
        }
    }
}
