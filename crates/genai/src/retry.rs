//! Bounded retry with exponential backoff for rate-limited upstream calls.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{error, warn};

use crate::GenAiError;

/// Total attempts before giving up.
pub const MAX_ATTEMPTS: u32 = 3;

/// First backoff delay; doubles on each further attempt.
pub const BASE_DELAY: Duration = Duration::from_secs(5);

/// Run `f` up to [`MAX_ATTEMPTS`] times. Only retryable errors (rate limits)
/// trigger a backoff; anything else is returned immediately.
pub async fn with_backoff<T, Fut>(
    op: &str,
    f: impl FnMut() -> Fut,
) -> Result<T, GenAiError>
where
    Fut: Future<Output = Result<T, GenAiError>>,
{
    retry(op, MAX_ATTEMPTS, BASE_DELAY, f).await
}

pub async fn retry<T, Fut>(
    op: &str,
    max_attempts: u32,
    base_delay: Duration,
    mut f: impl FnMut() -> Fut,
) -> Result<T, GenAiError>
where
    Fut: Future<Output = Result<T, GenAiError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                let backoff = base_delay * 2u32.pow(attempt);
                let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..500));
                warn!(
                    op,
                    attempt = attempt + 1,
                    delay_secs = backoff.as_secs(),
                    error = %e,
                    "rate limited, backing off"
                );
                tokio::time::sleep(backoff + jitter).await;
                attempt += 1;
            }
            Err(e) => {
                error!(op, attempt = attempt + 1, error = %e, "giving up");
                return Err(e);
            }
        }
    }
}
