//! Resilience patterns for the Mailgun client.
//!
//! Idempotent requests are retried on transient failures; everything else is
//! sent exactly once.

mod retry;

pub use retry::{
    parse_retry_after, RetryConfig, RetryDecision, RetryPolicy, RETRYABLE_STATUS_CODES,
    RETRY_AFTER_STATUS_CODES,
};
