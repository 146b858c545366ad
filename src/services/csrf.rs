//! CSRF token core logic.
//!
//! This module knows nothing about axum. The middleware pulls the submitted
//! token out of the request and calls [`verify`]; templates call [`mask`]
//! through `TemplateData`.
//!
//! The per-session secret never leaves the session cookie as-is. Every render
//! hands out `base64url(otp || otp ^ secret)` with a fresh one-time pad, so the
//! token embedded in a page differs on each response.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use subtle::ConstantTimeEq;
use thiserror::Error;

pub const TOKEN_LEN: usize = 32;

/// Form field carrying the masked token.
pub const FORM_FIELD: &str = "csrf_token";
/// Header alternative to the form field (also set on rendered responses).
pub const HEADER: &str = "x-csrf-token";

#[derive(Debug, Error)]
pub enum CsrfError {
    #[error("random source failed: {0}")]
    Random(String),
    #[error("session csrf secret is malformed")]
    MalformedSecret,
}

fn random_bytes() -> Result<[u8; TOKEN_LEN], CsrfError> {
    let mut bytes = [0u8; TOKEN_LEN];
    getrandom::fill(&mut bytes).map_err(|e| CsrfError::Random(e.to_string()))?;
    Ok(bytes)
}

fn decode_secret(secret: &str) -> Result<[u8; TOKEN_LEN], CsrfError> {
    URL_SAFE_NO_PAD
        .decode(secret)
        .ok()
        .and_then(|v| <[u8; TOKEN_LEN]>::try_from(v).ok())
        .ok_or(CsrfError::MalformedSecret)
}

/// New per-session secret, base64url encoded.
pub fn generate_secret() -> Result<String, CsrfError> {
    Ok(URL_SAFE_NO_PAD.encode(random_bytes()?))
}

/// Masks the session secret for embedding in a page.
pub fn mask(secret: &str) -> Result<String, CsrfError> {
    let secret = decode_secret(secret)?;
    let otp = random_bytes()?;

    let mut out = Vec::with_capacity(TOKEN_LEN * 2);
    out.extend_from_slice(&otp);
    out.extend(otp.iter().zip(secret.iter()).map(|(a, b)| a ^ b));

    Ok(URL_SAFE_NO_PAD.encode(out))
}

/// True when `submitted` unmasks to the session secret.
pub fn verify(secret: &str, submitted: &str) -> bool {
    let Ok(secret) = decode_secret(secret) else {
        return false;
    };
    let Ok(raw) = URL_SAFE_NO_PAD.decode(submitted.trim()) else {
        return false;
    };
    if raw.len() != TOKEN_LEN * 2 {
        return false;
    }

    let (otp, masked) = raw.split_at(TOKEN_LEN);
    let unmasked: Vec<u8> = otp.iter().zip(masked).map(|(a, b)| a ^ b).collect();

    // ct_eq on slices is false for unequal lengths
    unmasked.as_slice().ct_eq(secret.as_slice()).into()
}
