//! HTTP transport implementation using reqwest.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use super::{HttpRequest, HttpResponse, RequestBody, Transport};
use crate::errors::{MailgunError, MailgunResult};
use crate::resilience::{RetryConfig, RetryDecision, RetryPolicy};

/// Configuration for ReqwestTransport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// Retry policy for idempotent requests.
    pub retry: RetryConfig,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: crate::config::DEFAULT_TIMEOUT,
            retry: RetryConfig::default(),
        }
    }
}

/// Reqwest-based HTTP transport implementation.
pub struct ReqwestTransport {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl ReqwestTransport {
    /// Creates a new reqwest transport.
    pub fn new(timeout: Duration) -> MailgunResult<Self> {
        Self::with_config(TransportConfig {
            timeout,
            ..Default::default()
        })
    }

    /// Creates a new transport with configuration.
    pub fn with_config(config: TransportConfig) -> MailgunResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| MailgunError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            retry: RetryPolicy::new(config.retry),
        })
    }

    /// Creates a new transport with a custom client.
    pub fn with_client(client: reqwest::Client, retry: RetryConfig) -> Self {
        Self {
            client,
            retry: RetryPolicy::new(retry),
        }
    }

    /// Sends the request once.
    async fn execute(&self, request: &HttpRequest) -> MailgunResult<HttpResponse> {
        let mut builder = self.client.request(request.method.into(), &request.url);

        let is_multipart = matches!(request.body, Some(RequestBody::Multipart(_)));
        for (key, value) in &request.headers {
            // Multipart sets its own Content-Type with the boundary.
            if is_multipart && key.eq_ignore_ascii_case("content-type") {
                continue;
            }
            builder = builder.header(key, value);
        }

        builder = match &request.body {
            Some(RequestBody::Raw(bytes)) => builder.body(bytes.clone()),
            Some(RequestBody::Multipart(form)) => builder.multipart(form.to_multipart()),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = Self::extract_headers(response.headers());
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().map(str::to_string),
            headers,
            body,
        })
    }

    /// Converts response headers to a HashMap with lowercase names.
    fn extract_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|val| (k.as_str().to_lowercase(), val.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> MailgunResult<HttpResponse> {
        let mut attempt = 0;

        loop {
            let decision = match self.execute(&request).await {
                Ok(response) => {
                    let decision = self.retry.on_status(
                        request.method,
                        attempt,
                        response.status,
                        response.headers.get("retry-after").map(String::as_str),
                    );
                    if decision == RetryDecision::Stop {
                        return Ok(response);
                    }
                    decision
                }
                Err(error) if error.is_transport() => {
                    let decision = self.retry.on_transport_error(request.method, attempt);
                    if decision == RetryDecision::Stop {
                        return Err(error);
                    }
                    decision
                }
                Err(error) => return Err(error),
            };

            if let RetryDecision::Retry(delay) = decision {
                attempt += 1;
                tracing::warn!(
                    method = %request.method,
                    url = %request.url,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying request"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
