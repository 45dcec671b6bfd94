//! Retry policy for idempotent requests with exponential backoff.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::transport::Method;

/// Status codes that are retried for idempotent requests.
pub const RETRYABLE_STATUS_CODES: &[u16] = &[408, 413, 429, 500, 502, 503, 504];

/// Status codes for which a `Retry-After` header is honored.
pub const RETRY_AFTER_STATUS_CODES: &[u16] = &[413, 429, 503];

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Initial backoff delay.
    pub initial_backoff: Duration,
    /// Maximum backoff delay.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub backoff_multiplier: f64,
    /// Jitter factor (0.0 to 1.0).
    pub jitter: f64,
    /// Largest `Retry-After` the client is willing to wait for.
    pub max_retry_after: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(300),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: 0.0,
            max_retry_after: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    /// A configuration that never retries.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }
}

/// What to do after an attempt completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Hand the outcome to the caller.
    Stop,
    /// Wait, then send the request again.
    Retry(Duration),
}

/// Decides whether and when a request is retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Creates a new retry policy.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Returns true if the method may be retried at all.
    pub fn is_retryable_method(method: Method) -> bool {
        method.is_idempotent()
    }

    /// Decides what to do after a response with the given status.
    ///
    /// `attempt` is zero-based: the first retry is decided with `attempt == 0`.
    pub fn on_status(
        &self,
        method: Method,
        attempt: u32,
        status: u16,
        retry_after: Option<&str>,
    ) -> RetryDecision {
        if !Self::is_retryable_method(method)
            || attempt >= self.config.max_retries
            || !RETRYABLE_STATUS_CODES.contains(&status)
        {
            return RetryDecision::Stop;
        }

        if RETRY_AFTER_STATUS_CODES.contains(&status) {
            if let Some(delay) = retry_after.and_then(parse_retry_after) {
                if delay > self.config.max_retry_after {
                    return RetryDecision::Stop;
                }
                return RetryDecision::Retry(delay);
            }
        }

        RetryDecision::Retry(self.calculate_backoff(attempt))
    }

    /// Decides what to do after a network or timeout failure.
    pub fn on_transport_error(&self, method: Method, attempt: u32) -> RetryDecision {
        if !Self::is_retryable_method(method) || attempt >= self.config.max_retries {
            return RetryDecision::Stop;
        }
        RetryDecision::Retry(self.calculate_backoff(attempt))
    }

    /// Calculates the backoff delay with jitter.
    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let base_delay = self.config.initial_backoff.as_secs_f64()
            * self.config.backoff_multiplier.powi(attempt as i32);

        let capped_delay = base_delay.min(self.config.max_backoff.as_secs_f64());

        let jitter_range = capped_delay * self.config.jitter;
        let jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter_range;
        let final_delay = (capped_delay + jitter).max(0.0);

        Duration::from_secs_f64(final_delay)
    }
}

/// Parses a `Retry-After` header given in seconds or as an HTTP date.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();

    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let date = DateTime::parse_from_rfc2822(value).ok()?;
    let wait = date.with_timezone(&Utc) - Utc::now();
    Some(wait.to_std().unwrap_or(Duration::ZERO))
}
