//! HTTP retry policy with exponential backoff.
//!
//! # Retry Policy
//!
//! - Max retries: 9 (10 total attempts)
//! - Initial delay: 5 seconds, doubling per attempt
//! - Max delay: 60 seconds
//! - Jitter: down-jitter up to 25% (multiplier in [0.75, 1.0])
//!
//! # Retryable Conditions
//!
//! - HTTP 408, 409, 429, 5xx
//! - Connection errors and timeouts
//! - `x-should-retry: true` forces retry
//! - `x-should-retry: false` forbids retry
//!
//! Exhausting the policy never terminates the process. The caller receives a
//! [`RetryOutcome`] and decides whether the failure ends one document or the
//! whole run.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode, header::HeaderMap};

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries (not counting initial request).
    pub max_retries: u32,
    /// Initial backoff delay before first retry.
    pub initial_delay: Duration,
    /// Maximum backoff delay.
    pub max_delay: Duration,
    /// Jitter factor for down-jitter (0.25 = up to 25% reduction).
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 9,
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            jitter_factor: 0.25,
        }
    }
}

impl RetryConfig {
    /// Total attempts including the initial request.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Parse `Retry-After` or `Retry-After-Ms` headers.
///
/// Returns `Some(duration)` if a valid value is found and `0 < duration < 60s`.
/// Returns `None` if headers are missing, invalid, or out of range.
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    if let Some(val) = headers.get("retry-after-ms")
        && let Ok(s) = val.to_str()
        && let Ok(ms) = s.parse::<f64>()
    {
        let duration = Duration::from_secs_f64(ms / 1000.0);
        if duration > Duration::ZERO && duration < Duration::from_secs(60) {
            return Some(duration);
        }
    }

    if let Some(val) = headers.get("retry-after")
        && let Ok(s) = val.to_str()
        && let Ok(secs) = s.parse::<u64>()
    {
        let duration = Duration::from_secs(secs);
        if duration > Duration::ZERO && duration < Duration::from_secs(60) {
            return Some(duration);
        }
    }

    None
}

/// Determine if a response status is transient (worth retrying).
///
/// Respects `x-should-retry` header override if present.
#[must_use]
pub fn is_transient_status(status: StatusCode, headers: &HeaderMap) -> bool {
    if let Some(val) = headers.get("x-should-retry")
        && let Ok(s) = val.to_str()
    {
        if s.eq_ignore_ascii_case("true") {
            return true;
        }
        if s.eq_ignore_ascii_case("false") {
            return false;
        }
    }

    matches!(
        status.as_u16(),
        408 | 409 | 429 | 500 | 502 | 503 | 504 | 520..=599
    )
}

/// Calculate retry delay with exponential backoff and jitter.
///
/// - `backoff_step`: 0 before first retry, 1 before second, etc.
/// - Respects `Retry-After` headers if present and valid.
#[must_use]
pub fn calculate_retry_delay(
    backoff_step: u32,
    config: &RetryConfig,
    headers: Option<&HeaderMap>,
) -> Duration {
    if let Some(headers) = headers
        && let Some(delay) = parse_retry_after(headers)
    {
        return delay;
    }

    let exponent = backoff_step.min(30) as i32;
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    let jitter = 1.0 - rand::random::<f64>() * config.jitter_factor;
    Duration::from_secs_f64(capped * jitter)
}

/// Outcome of a retried request.
///
/// Failure variants carry whether the last failure was transient, so callers
/// can tell "gave up on a flaky service" from "the service said no".
#[derive(Debug)]
pub enum RetryOutcome {
    /// Request succeeded (2xx status).
    Success(Response),
    /// Final response was a non-2xx status.
    /// The response is provided for error body inspection.
    HttpError {
        response: Response,
        attempts: u32,
        transient: bool,
    },
    /// Final attempt failed at the transport layer.
    ConnectionError {
        attempts: u32,
        transient: bool,
        source: reqwest::Error,
    },
}

impl RetryOutcome {
    /// Returns true if this is a successful response.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Send a request with automatic retries.
///
/// `build_request` is called once per attempt. Transient failures are retried
/// until `config.max_retries` is exhausted; anything else returns at once.
pub async fn send_with_retry<F>(build_request: F, config: &RetryConfig) -> RetryOutcome
where
    F: Fn() -> RequestBuilder,
{
    let mut retry_count = 0u32;

    loop {
        let attempts = retry_count + 1;
        let can_retry = retry_count < config.max_retries;

        match build_request().send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return RetryOutcome::Success(response);
                }

                let transient = is_transient_status(status, response.headers());
                if !(transient && can_retry) {
                    return RetryOutcome::HttpError {
                        response,
                        attempts,
                        transient,
                    };
                }

                let delay = calculate_retry_delay(retry_count, config, Some(response.headers()));
                tracing::warn!(
                    status = %status,
                    attempt = attempts,
                    max_attempts = config.max_attempts(),
                    delay_ms = delay.as_millis(),
                    "Transient error status from completion endpoint, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                let transient = is_retryable_error(&e);
                if !(transient && can_retry) {
                    return RetryOutcome::ConnectionError {
                        attempts,
                        transient,
                        source: e,
                    };
                }

                let delay = calculate_retry_delay(retry_count, config, None);
                tracing::warn!(
                    error = %e,
                    attempt = attempts,
                    max_attempts = config.max_attempts(),
                    delay_ms = delay.as_millis(),
                    "Connection error to completion endpoint, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }

        retry_count += 1;
    }
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout() || error.is_request()
}
