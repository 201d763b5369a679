//! Clients for the generative APIs (text, speech, images) plus the bounded
//! retry wrapper used around them.

pub mod gemini;
pub mod imagen;
pub mod provider;
pub mod retry;
pub mod speech;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenAiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("decode error: {0}")]
    Decode(String),
}

impl GenAiError {
    /// Only rate-limit/quota failures are worth retrying; anything else is a
    /// hard failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// Classify an upstream error response. 429s and quota complaints become
/// `RateLimited` so the retry wrapper backs off instead of giving up.
pub(crate) fn classify_status(status: reqwest::StatusCode, body: &str) -> GenAiError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || body.to_lowercase().contains("quota") {
        GenAiError::RateLimited(format!("{status}: {body}"))
    } else {
        GenAiError::Provider(format!("{status}: {body}"))
    }
}
