/*
 * Responsibility
 * - handler / middleware 共通の AppError
 * - IntoResponse: status + plain text の reason phrase (HTML アプリなので JSON body は返さない)
 * - Internal エラーは原因チェーンごとログに出してから 500 に畳む
 */
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::session::SessionError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request")]
    BadRequest,
    #[error("not found")]
    NotFound,
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("CSRF token invalid or expired")]
    CsrfRejected,
    #[error("internal server error: {0:#}")]
    Internal(anyhow::Error),
}

impl AppError {
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest | AppError::CsrfRejected => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::CsrfRejected => self.to_string(),
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "request failed");
                reason(status)
            }
            _ => reason(status),
        };

        (status, body).into_response()
    }
}

fn reason(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("Unknown").to_string()
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        AppError::internal(e)
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        AppError::internal(e)
    }
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        AppError::internal(e)
    }
}
