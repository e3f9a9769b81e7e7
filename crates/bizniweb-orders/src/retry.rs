//! Fixed-backoff retry for order API requests.
//!
//! Network failures, 429 and 5xx responses are retried; auth failures,
//! GraphQL errors and undecodable bodies are returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::OrderApiError;

/// Upper bound on a server-requested `Retry-After` wait.
const MAX_RETRY_AFTER_SECS: u64 = 120;

fn is_retriable(err: &OrderApiError) -> bool {
    match err {
        OrderApiError::RateLimited { .. } => true,
        OrderApiError::UnexpectedStatus { status, .. } => *status >= 500,
        OrderApiError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
        }
        _ => false,
    }
}

fn delay_for(err: &OrderApiError, backoff_secs: u64) -> Duration {
    let secs = match err {
        OrderApiError::RateLimited { retry_after_secs } => {
            backoff_secs.max((*retry_after_secs).min(MAX_RETRY_AFTER_SECS))
        }
        _ => backoff_secs,
    };
    Duration::from_secs(secs)
}

/// Runs `operation`, retrying transient failures up to `max_retries` times
/// with `backoff_secs` between attempts.
pub(crate) async fn retry_fixed<T, F, Fut>(
    max_retries: u32,
    backoff_secs: u64,
    mut operation: F,
) -> Result<T, OrderApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, OrderApiError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        attempt += 1;
        let delay = delay_for(&err, backoff_secs);
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs = delay.as_secs(),
            error = %err,
            "order API request failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
