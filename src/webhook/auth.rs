use axum::http::{header::AUTHORIZATION, HeaderMap};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const SECRET_HEADER: &str = "x-webhook-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("missing webhook credentials")]
    MissingCredentials,
    #[error("invalid webhook credentials")]
    InvalidCredentials,
}

/// Check the shared secret sent as `X-Webhook-Secret` or `Authorization: Bearer`.
///
/// An empty `expected` secret disables the check.
pub fn verify_secret(headers: &HeaderMap, expected: &str) -> Result<(), WebhookError> {
    if expected.is_empty() {
        return Ok(());
    }

    let provided = headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
        })
        .map(str::trim)
        .ok_or(WebhookError::MissingCredentials)?;

    // fixed-length digests keep the comparison independent of the secret length
    if Sha256::digest(provided.as_bytes()) == Sha256::digest(expected.as_bytes()) {
        Ok(())
    } else {
        Err(WebhookError::InvalidCredentials)
    }
}
