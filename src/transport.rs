//! The transport collaborator.
//!
//! A [`Transport`] performs one logical request: the retry/backoff policy
//! lives entirely inside it, parameterized by the client's configured retry
//! count and maximum wait. The execution engine never retries on its own.
//!
//! [`RetryingTransport`] is the default implementation, built on `reqwest`.
//! It retries network errors and retryable statuses (429 and 5xx except 501)
//! with exponential backoff and jitter, honors `Retry-After`, and returns
//! non-retryable responses — 404 included — as successful transport results.

use crate::{Error, Result};
use async_trait::async_trait;
use http::header::RETRY_AFTER;
use http::{HeaderMap, StatusCode};
use rand::Rng;
use std::time::{Duration, SystemTime};

/// Performs one HTTP request, retrying internally as its policy dictates.
///
/// Implementations must be safe for concurrent use. Tests inject counting or
/// faulting transports through
/// [`ClientBuilder::transport`](crate::ClientBuilder::transport).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request, returning the final response or a transport error.
    async fn send(&self, request: reqwest::Request) -> Result<reqwest::Response>;
}

/// Retry parameters copied from the client at construction time.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Floor for the exponential backoff.
    pub wait_min: Duration,
    /// Ceiling for any wait, backoff or `Retry-After`.
    pub wait_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            wait_min: Duration::from_millis(100),
            wait_max: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry `attempt` (1-indexed): `wait_min * 2^(attempt-1)`
    /// capped at `wait_max`, with 50–100% jitter.
    pub fn backoff(&self, attempt: usize) -> Duration {
        let multiplier = 2u64.saturating_pow(attempt.saturating_sub(1) as u32);
        let base = self
            .wait_min
            .saturating_mul(multiplier.try_into().unwrap_or(u32::MAX))
            .min(self.wait_max);
        let jitter = rand::thread_rng().gen_range(0.5..=1.0);
        base.mul_f64(jitter)
    }

    /// 429 and 5xx are retryable, except 501 which a server will keep
    /// returning no matter how often we ask.
    pub fn retryable_status(&self, status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS
            || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
    }
}

/// The default [`Transport`]: a `reqwest` client wrapped in a retry loop.
pub struct RetryingTransport {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl RetryingTransport {
    /// Wraps `client` with the given retry policy.
    pub fn new(client: reqwest::Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }
}

#[async_trait]
impl Transport for RetryingTransport {
    async fn send(&self, request: reqwest::Request) -> Result<reqwest::Response> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            // Bodies are always full byte buffers here, so cloning cannot fail
            // in practice.
            let attempt_request = request.try_clone().ok_or_else(|| {
                Error::Configuration("request body cannot be cloned for retry".to_string())
            })?;

            match self.client.execute(attempt_request).await {
                Ok(response) if !self.policy.retryable_status(response.status()) => {
                    return Ok(response);
                }
                Ok(response) => {
                    let status = response.status();
                    if attempt > self.policy.max_retries {
                        return Err(Error::RetriesExhausted {
                            attempts: attempt,
                            last_status: Some(status),
                            source: None,
                        });
                    }
                    let delay = retry_after(response.headers())
                        .map(|wait| wait.min(self.policy.wait_max))
                        .unwrap_or_else(|| self.policy.backoff(attempt));
                    tracing::warn!(
                        status = status.as_u16(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "retryable status, retrying request"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    if error.is_builder() || error.is_redirect() {
                        return Err(Error::Network(error));
                    }
                    if attempt > self.policy.max_retries {
                        return Err(Error::RetriesExhausted {
                            attempts: attempt,
                            last_status: None,
                            source: Some(error),
                        });
                    }
                    let delay = self.policy.backoff(attempt);
                    tracing::warn!(
                        error = %error,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "network error, retrying request"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Parses `Retry-After`, in both delta-seconds and HTTP-date forms.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?;

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    if let Ok(date) = httpdate::parse_http_date(value) {
        if let Ok(delay) = date.duration_since(SystemTime::now()) {
            return Some(delay);
        }
    }

    None
}
