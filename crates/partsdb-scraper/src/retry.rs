//! Retry utilities for page navigation.
//!
//! Navigation timeouts and browser-level failures are retried with exponential
//! backoff. Content and extraction failures are propagated immediately: the
//! page loaded, it just did not contain what we need.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Upper bound on a single backoff sleep.
const MAX_BACKOFF_MS: u64 = 60_000;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a backoff delay.
///
/// Retriable errors:
/// - [`ScraperError::NavigationTimeout`]: the page did not finish loading in time.
/// - [`ScraperError::Navigation`]: the browser reported a navigation failure.
/// - [`ScraperError::Browser`]: CDP-level failure (tab crashed, socket reset).
fn is_retriable(err: &ScraperError) -> bool {
    matches!(
        err,
        ScraperError::NavigationTimeout { .. }
            | ScraperError::Navigation { .. }
            | ScraperError::Browser(_)
    )
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// The wait before retry `n` (1-based) is `backoff_base_ms * 2^(n-1)`
/// milliseconds, capped at one minute. With `max_retries = 1` the operation is
/// attempted at most twice.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut last_err;
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                last_err = err;
            }
        }

        let delay_ms = backoff_base_ms
            .saturating_mul(1u64 << attempt.min(62))
            .min(MAX_BACKOFF_MS);
        tracing::warn!(
            attempt,
            max_retries,
            delay_ms,
            error = %last_err,
            "transient navigation error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        attempt += 1;
    }
}
