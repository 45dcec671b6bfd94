//! Configuration module for the Mailgun client.
//!
//! Provides configuration management including credentials, base URL,
//! timeout, default headers and retry settings.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::errors::{MailgunError, MailgunResult};
use crate::resilience::RetryConfig;

/// Default base URL for the Mailgun API.
pub const DEFAULT_BASE_URL: &str = "https://api.mailgun.net";

/// Default username for API key authentication.
pub const DEFAULT_USERNAME: &str = "api";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the Mailgun client.
#[derive(Clone)]
pub struct MailgunConfig {
    /// Basic-auth username.
    pub username: String,
    /// Private API key (stored securely).
    pub(crate) key: SecretString,
    /// Public validation key (stored securely).
    pub(crate) public_key: Option<SecretString>,
    /// Base URL for API requests.
    pub url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Headers sent with every request.
    pub headers: Vec<(String, String)>,
    /// Retry policy for idempotent requests.
    pub retry: RetryConfig,
}

impl MailgunConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> MailgunConfigBuilder {
        MailgunConfigBuilder::new()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `MAILGUN_API_KEY` (required): private API key
    /// - `MAILGUN_USERNAME` (optional): Basic-auth username, defaults to `api`
    /// - `MAILGUN_BASE_URL` (optional): custom base URL, e.g. the EU region
    /// - `MAILGUN_TIMEOUT` (optional): request timeout in seconds
    /// - `MAILGUN_PUBLIC_KEY` (optional): public validation key
    pub fn from_env() -> MailgunResult<Self> {
        let key = std::env::var("MAILGUN_API_KEY").map_err(|_| MailgunError::Configuration {
            message: "MAILGUN_API_KEY environment variable not set".to_string(),
        })?;

        let username =
            std::env::var("MAILGUN_USERNAME").unwrap_or_else(|_| DEFAULT_USERNAME.to_string());

        let mut builder = MailgunConfigBuilder::new().username(username).key(key);

        if let Ok(url) = std::env::var("MAILGUN_BASE_URL") {
            builder = builder.url(url);
        }

        if let Ok(timeout_str) = std::env::var("MAILGUN_TIMEOUT") {
            if let Ok(timeout_secs) = timeout_str.parse::<u64>() {
                builder = builder.timeout(Duration::from_secs(timeout_secs));
            }
        }

        if let Ok(public_key) = std::env::var("MAILGUN_PUBLIC_KEY") {
            builder = builder.public_key(public_key);
        }

        builder.build()
    }

    /// Returns the private API key (exposing the secret).
    pub(crate) fn key(&self) -> &str {
        self.key.expose_secret()
    }

    /// Returns the public key (exposing the secret), if configured.
    pub(crate) fn public_key(&self) -> Option<&str> {
        self.public_key.as_ref().map(|k| k.expose_secret().as_str())
    }

    /// Returns true if a public key is configured.
    pub fn has_public_key(&self) -> bool {
        self.public_key.is_some()
    }
}

impl std::fmt::Debug for MailgunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailgunConfig")
            .field("username", &self.username)
            .field("key", &"[REDACTED]")
            .field(
                "public_key",
                &self.public_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .field("headers", &self.headers.len())
            .field("retry", &self.retry)
            .finish()
    }
}

/// Builder for `MailgunConfig`.
#[derive(Default)]
pub struct MailgunConfigBuilder {
    username: Option<String>,
    key: Option<String>,
    public_key: Option<String>,
    url: Option<String>,
    timeout: Option<Duration>,
    headers: Vec<(String, String)>,
    retry: Option<RetryConfig>,
}

impl MailgunConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Basic-auth username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the private API key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the public validation key.
    pub fn public_key(mut self, public_key: impl Into<String>) -> Self {
        self.public_key = Some(public_key.into());
        self
    }

    /// Sets the base URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the retry policy.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Disables retries.
    pub fn no_retry(mut self) -> Self {
        self.retry = Some(RetryConfig::disabled());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> MailgunResult<MailgunConfig> {
        let username = self.username.ok_or_else(|| MailgunError::Configuration {
            message: "Parameter \"username\" is required".to_string(),
        })?;

        let key = self.key.ok_or_else(|| MailgunError::Configuration {
            message: "Parameter \"key\" is required".to_string(),
        })?;

        if username.is_empty() {
            return Err(MailgunError::Configuration {
                message: "Username cannot be empty".to_string(),
            });
        }

        if key.is_empty() {
            return Err(MailgunError::Configuration {
                message: "API key cannot be empty".to_string(),
            });
        }

        let url = self
            .url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(MailgunError::Configuration {
                message: "Base URL must start with http:// or https://".to_string(),
            });
        }

        url::Url::parse(&url)?;

        Ok(MailgunConfig {
            username,
            key: SecretString::new(key),
            public_key: self
                .public_key
                .filter(|k| !k.is_empty())
                .map(SecretString::new),
            url,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            headers: self.headers,
            retry: self.retry.unwrap_or_default(),
        })
    }
}
