//! Fixed-backoff retry for the ad clients.
//!
//! [`retry_fixed`] retries transient failures (timeouts, connection errors,
//! 429, 5xx). Auth, API, decode and other 4xx errors are returned
//! immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::AdsError;

const MAX_RETRY_AFTER_SECS: u64 = 120;

pub(crate) fn is_retriable(err: &AdsError) -> bool {
    match err {
        AdsError::Http(e) => e.is_timeout() || e.is_connect(),
        AdsError::RateLimited { .. } => true,
        AdsError::UnexpectedStatus { status, .. } => *status >= 500,
        AdsError::Auth { .. }
        | AdsError::Api { .. }
        | AdsError::Deserialize { .. }
        | AdsError::InvalidBaseUrl { .. }
        | AdsError::PaginationLimit { .. }
        | AdsError::CacheIo { .. }
        | AdsError::CacheEncode { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts, sleeping
/// `backoff_secs` between them. A `Retry-After` longer than the backoff is
/// honoured, capped at two minutes.
pub(crate) async fn retry_fixed<T, F, Fut>(
    max_retries: u32,
    backoff_secs: u64,
    mut operation: F,
) -> Result<T, AdsError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AdsError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay_secs = match &err {
                    AdsError::RateLimited {
                        retry_after_secs, ..
                    } => backoff_secs.max((*retry_after_secs).min(MAX_RETRY_AFTER_SECS)),
                    _ => backoff_secs,
                };
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_secs,
                    error = %err,
                    "ad platform request failed, retrying"
                );
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
            }
        }
    }
}
