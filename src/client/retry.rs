use crate::errors::AppError;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::warn;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_tries: u32,
    /// No new attempt is started once this much time has passed since the first one
    pub max_time: Duration,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_tries: 5,
            max_time: Duration::from_secs(60),
            initial_delay_ms: 1000,
            max_delay_ms: 10000,
        }
    }
}

/// Determines if an error should trigger a retry attempt.
///
/// Returns `true` for transport errors (connection failures, timeouts), server errors
/// (5xx) and rate limiting (429). Everything else is permanent.
pub fn should_retry(error: &AppError) -> bool {
    match error {
        AppError::NetworkError(_) => true,
        AppError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
        _ => false,
    }
}

/// Calculates exponential backoff delay in milliseconds.
///
/// Formula: `min(initial_delay * 2^attempt, max_delay)`
pub fn calculate_backoff(attempt: u32, policy: &RetryPolicy) -> u64 {
    let factor = 2_u64.checked_pow(attempt).unwrap_or(u64::MAX);
    policy
        .initial_delay_ms
        .saturating_mul(factor)
        .min(policy.max_delay_ms)
}

/// Runs `operation` until it succeeds, fails permanently, or the policy is exhausted.
///
/// `label` identifies the request in retry logs.
pub(crate) async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let started = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let tries_left = attempt + 1 < policy.max_tries;
                let delay_ms = calculate_backoff(attempt, policy);
                let within_time =
                    started.elapsed() + Duration::from_millis(delay_ms) <= policy.max_time;

                if !(tries_left && within_time && should_retry(&e)) {
                    return Err(e);
                }

                warn!(
                    request = label,
                    attempt = attempt + 1,
                    max_tries = policy.max_tries,
                    delay_ms = delay_ms,
                    error = %e,
                    "Retrying request after error"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
        }
    }
}
