//! Mailgun API client.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{MailgunConfig, MailgunConfigBuilder};
use crate::errors::MailgunResult;
use crate::observability::LogConfig;
use crate::request::RequestGateway;
use crate::resilience::RetryConfig;
use crate::services::{DefaultSuppressionsService, SuppressionsService};
use crate::transport::{ReqwestTransport, Transport, TransportConfig};

/// The main Mailgun client.
pub struct MailgunClient {
    config: MailgunConfig,
    request: Arc<RequestGateway>,
    public_request: Option<Arc<RequestGateway>>,
}

impl MailgunClient {
    /// Creates a new Mailgun client with the given configuration.
    pub fn new(config: MailgunConfig) -> MailgunResult<Self> {
        let transport = ReqwestTransport::with_config(TransportConfig {
            timeout: config.timeout,
            retry: config.retry.clone(),
        })?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates a client that sends every request through `transport`.
    pub fn with_transport(config: MailgunConfig, transport: Arc<dyn Transport>) -> Self {
        Self::assemble(config, transport, LogConfig::default())
    }

    fn assemble(config: MailgunConfig, transport: Arc<dyn Transport>, log: LogConfig) -> Self {
        let request = Arc::new(
            RequestGateway::with_transport(&config, transport.clone()).with_log_config(log.clone()),
        );

        let public_request = config.public_key().map(|public_key| {
            Arc::new(
                RequestGateway::with_key(&config, public_key, transport)
                    .with_log_config(log),
            )
        });

        tracing::debug!(
            url = %config.url,
            public_key = public_request.is_some(),
            "Mailgun client created"
        );

        Self {
            config,
            request,
            public_request,
        }
    }

    /// Creates a new client builder.
    pub fn builder() -> MailgunClientBuilder {
        MailgunClientBuilder::new()
    }

    /// Creates a client from the environment.
    pub fn from_env() -> MailgunResult<Self> {
        Self::new(MailgunConfig::from_env()?)
    }

    /// Returns the suppressions service.
    pub fn suppressions(&self) -> impl SuppressionsService {
        DefaultSuppressionsService::new(self.request.clone())
    }

    /// Returns the gateway authenticated with the private key.
    pub fn request(&self) -> &Arc<RequestGateway> {
        &self.request
    }

    /// Returns the gateway authenticated with the public key, if configured.
    pub fn public_request(&self) -> Option<&Arc<RequestGateway>> {
        self.public_request.as_ref()
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &MailgunConfig {
        &self.config
    }
}

impl std::fmt::Debug for MailgunClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailgunClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for the Mailgun client.
#[derive(Default)]
pub struct MailgunClientBuilder {
    config: MailgunConfigBuilder,
    has_username: bool,
    has_key: bool,
    transport: Option<Arc<dyn Transport>>,
    log: Option<LogConfig>,
}

impl MailgunClientBuilder {
    /// Creates a new client builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Basic-auth username. Defaults to `api`.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config = self.config.username(username);
        self.has_username = true;
        self
    }

    /// Sets the private API key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.config = self.config.key(key);
        self.has_key = true;
        self
    }

    /// Sets the public validation key.
    pub fn public_key(mut self, public_key: impl Into<String>) -> Self {
        self.config = self.config.public_key(public_key);
        self
    }

    /// Sets the base URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config = self.config.url(url);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Adds a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config = self.config.header(name, value);
        self
    }

    /// Sets the retry policy.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config = self.config.retry(retry);
        self
    }

    /// Disables retries.
    pub fn no_retry(mut self) -> Self {
        self.config = self.config.no_retry();
        self
    }

    /// Uses a custom transport instead of reqwest.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the logging settings used for request diagnostics.
    pub fn log_config(mut self, log: LogConfig) -> Self {
        self.log = Some(log);
        self
    }

    /// Builds the client.
    ///
    /// Falls back to `MAILGUN_API_KEY` when no key was given.
    pub fn build(self) -> MailgunResult<MailgunClient> {
        let mut config = self.config;
        if !self.has_username {
            config = config.username(crate::config::DEFAULT_USERNAME);
        }
        if !self.has_key {
            if let Ok(key) = std::env::var("MAILGUN_API_KEY") {
                config = config.key(key);
            }
        }
        let config = config.build()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::with_config(TransportConfig {
                timeout: config.timeout,
                retry: config.retry.clone(),
            })?),
        };

        Ok(MailgunClient::assemble(
            config,
            transport,
            self.log.unwrap_or_default(),
        ))
    }
}
