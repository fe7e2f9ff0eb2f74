//! Bounded exponential-backoff retry for REST calls.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use reqwest::Response;
use tracing::{debug, warn};

use crate::error::UpstreamError;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts made after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn no_retry() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay slept after the given zero-based failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_RETRIES,
            Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        )
    }
}

/// Runs `operation` until it succeeds or the retry budget is spent, sleeping
/// with exponential backoff between attempts. The last error is returned.
///
/// `operation` is invoked fresh for every attempt, so only operations that
/// are safe to repeat belong here.
pub async fn with_retry<T, E, F, Fut>(operation: F, label: &str, policy: RetryPolicy) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(label, attempt, "Request succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt >= policy.max_retries => return Err(e),
            Err(e) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    label,
                    error = %e,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Request failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Issues a raw request through [`with_retry`], treating non-success
/// statuses and transport errors alike. After the budget is spent the error
/// carries `label`, the last status and the last response body.
pub async fn retrying_request<F, Fut>(
    issue: F,
    label: &str,
    policy: RetryPolicy,
) -> Result<Response, UpstreamError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    with_retry(
        || async {
            match issue().await {
                Ok(response) if response.status().is_success() => Ok(response),
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    Err(UpstreamError::Exhausted {
                        label: label.to_string(),
                        status,
                        body,
                    })
                }
                Err(e) => Err(UpstreamError::Transport {
                    label: label.to_string(),
                    message: e.to_string(),
                }),
            }
        },
        label,
        policy,
    )
    .await
}
