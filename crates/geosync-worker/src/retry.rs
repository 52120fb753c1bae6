//! Bounded retry helper for transient operations inside capabilities.

use std::time::Duration;

use geosync_core::result::AppResult;

/// Run `op` until it succeeds or `max_attempts` is reached, with a short
/// linear backoff between attempts.
///
/// This bounds *in-capability* retries of transient failures (storage
/// briefly unavailable); job-level retry is always a client-initiated
/// resubmission. A `max_attempts` of zero behaves as one attempt.
pub async fn with_attempts<T, F, Fut>(max_attempts: u32, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = AppResult<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_attempts => return Err(e),
            Err(e) => {
                tracing::warn!(attempt, max_attempts, error = %e, "Attempt failed, retrying");
                tokio::time::sleep(Duration::from_millis(50 * u64::from(attempt))).await;
            }
        }
    }
}
