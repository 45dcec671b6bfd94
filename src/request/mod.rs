//! Request gateway shared by every resource client.
//!
//! The gateway owns the base URL, credentials and default headers. It turns
//! verb calls into transport requests and normalizes non-2xx responses into
//! [`MailgunError::Api`].

use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::{AuthManager, BasicAuthManager};
use crate::config::MailgunConfig;
use crate::errors::{MailgunError, MailgunResult};
use crate::observability::LogConfig;
use crate::transport::{
    FormData, HttpRequest, HttpResponse, Method, RequestBody, ReqwestTransport, Transport,
    TransportConfig,
};

/// Content type used by `post`, `put` and `patch` unless the caller overrides it.
pub const DEFAULT_COMMAND_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Characters escaped in a path segment; matches `encodeURIComponent`.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes a value for use as a single URL path segment.
pub fn encode_path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Query parameters, in order.
pub type Query = Vec<(String, String)>;

/// Per-call request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Headers that override the gateway defaults for this call.
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    /// Options carrying a JSON content type.
    pub fn json() -> Self {
        Self {
            headers: vec![(
                "Content-Type".to_string(),
                mime::APPLICATION_JSON.to_string(),
            )],
        }
    }
}

/// Successful API response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed JSON body; `Value::Null` when the body is empty.
    pub body: Value,
}

/// Authenticated gateway to the Mailgun HTTP API.
pub struct RequestGateway {
    base_url: String,
    auth: BasicAuthManager,
    transport: Arc<dyn Transport>,
    log: LogConfig,
}

impl RequestGateway {
    /// Creates a gateway backed by the reqwest transport.
    pub fn new(config: &MailgunConfig) -> MailgunResult<Self> {
        let transport = ReqwestTransport::with_config(TransportConfig {
            timeout: config.timeout,
            retry: config.retry.clone(),
        })?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates a gateway backed by a custom transport.
    pub fn with_transport(config: &MailgunConfig, transport: Arc<dyn Transport>) -> Self {
        Self::with_key(config, config.key(), transport)
    }

    /// Creates a gateway that authenticates with the given key.
    pub(crate) fn with_key(
        config: &MailgunConfig,
        key: &str,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            base_url: config.url.clone(),
            auth: BasicAuthManager::new(config.username.clone(), key, config.headers.clone()),
            transport,
            log: LogConfig::default(),
        }
    }

    /// Replaces the logging settings used for request diagnostics.
    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a GET request.
    pub async fn get(&self, path: &str, query: &[(String, String)]) -> MailgunResult<ApiResponse> {
        self.query(Method::Get, path, query).await
    }

    /// Sends a HEAD request.
    pub async fn head(&self, path: &str, query: &[(String, String)]) -> MailgunResult<ApiResponse> {
        self.query(Method::Head, path, query).await
    }

    /// Sends an OPTIONS request.
    pub async fn options(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> MailgunResult<ApiResponse> {
        self.query(Method::Options, path, query).await
    }

    /// Sends a POST request with a pre-serialized body.
    pub async fn post(
        &self,
        path: &str,
        body: impl Into<Bytes>,
        options: RequestOptions,
    ) -> MailgunResult<ApiResponse> {
        self.command(Method::Post, path, Some(body.into()), options)
            .await
    }

    /// Sends a POST request with multipart form data.
    pub async fn post_with_fd(&self, path: &str, data: &FormData) -> MailgunResult<ApiResponse> {
        self.form(Method::Post, path, data).await
    }

    /// Sends a PUT request with a pre-serialized body.
    pub async fn put(
        &self,
        path: &str,
        body: impl Into<Bytes>,
        options: RequestOptions,
    ) -> MailgunResult<ApiResponse> {
        self.command(Method::Put, path, Some(body.into()), options)
            .await
    }

    /// Sends a PUT request with multipart form data.
    pub async fn put_with_fd(&self, path: &str, data: &FormData) -> MailgunResult<ApiResponse> {
        self.form(Method::Put, path, data).await
    }

    /// Sends a PATCH request with a pre-serialized body.
    pub async fn patch(
        &self,
        path: &str,
        body: impl Into<Bytes>,
        options: RequestOptions,
    ) -> MailgunResult<ApiResponse> {
        self.command(Method::Patch, path, Some(body.into()), options)
            .await
    }

    /// Sends a DELETE request, optionally with a body.
    pub async fn delete(&self, path: &str, data: Option<String>) -> MailgunResult<ApiResponse> {
        self.command(Method::Delete, path, data.map(Bytes::from), RequestOptions::default())
            .await
    }

    async fn query(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
    ) -> MailgunResult<ApiResponse> {
        let url = self.build_url(path, query)?;
        self.execute(HttpRequest {
            method,
            url,
            headers: self.auth.get_headers(),
            body: None,
        })
        .await
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
        options: RequestOptions,
    ) -> MailgunResult<ApiResponse> {
        let url = self.build_url(path, &[])?;

        let mut headers = self.auth.get_headers();
        if !has_header(&headers, "content-type") {
            headers.insert(
                "Content-Type".to_string(),
                DEFAULT_COMMAND_CONTENT_TYPE.to_string(),
            );
        }
        merge_headers(&mut headers, options.headers);

        self.execute(HttpRequest {
            method,
            url,
            headers,
            body: body.map(RequestBody::Raw),
        })
        .await
    }

    async fn form(&self, method: Method, path: &str, data: &FormData) -> MailgunResult<ApiResponse> {
        let url = self.build_url(path, &[])?;
        self.execute(HttpRequest {
            method,
            url,
            headers: self.auth.get_headers(),
            body: Some(RequestBody::Multipart(data.clone())),
        })
        .await
    }

    async fn execute(&self, request: HttpRequest) -> MailgunResult<ApiResponse> {
        let method = request.method;
        let url = request.url.clone();

        let response = self.transport.send(request).await?;

        tracing::debug!(
            method = %method,
            url = %url,
            status = response.status,
            "Mailgun request completed"
        );

        if !response.is_success() {
            let error = api_error(&response);
            tracing::warn!(
                method = %method,
                url = %url,
                status = response.status,
                body = self.log.loggable_body(&response.body).as_deref(),
                "Mailgun request failed"
            );
            return Err(error);
        }

        let body = if response.body.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(&response.body).map_err(|e| MailgunError::Deserialization {
                message: e.to_string(),
                body: String::from_utf8_lossy(&response.body).to_string(),
            })?
        };

        Ok(ApiResponse {
            status: response.status,
            body,
        })
    }

    /// Joins the base URL and path with exactly one slash and appends the query.
    fn build_url(&self, path: &str, query: &[(String, String)]) -> MailgunResult<String> {
        let joined = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let mut url = url::Url::parse(&joined)?;

        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        Ok(url.to_string())
    }
}

impl std::fmt::Debug for RequestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGateway")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .finish()
    }
}

fn has_header(headers: &HashMap<String, String>, name: &str) -> bool {
    headers.keys().any(|key| key.eq_ignore_ascii_case(name))
}

/// Applies overrides, replacing existing headers case-insensitively.
fn merge_headers(headers: &mut HashMap<String, String>, overrides: Vec<(String, String)>) {
    for (name, value) in overrides {
        headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
        headers.insert(name, value);
    }
}

/// Builds the typed error for a non-2xx response.
fn api_error(response: &HttpResponse) -> MailgunError {
    let status_text = response
        .status_text
        .clone()
        .or_else(|| {
            http::StatusCode::from_u16(response.status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .map(str::to_string)
        })
        .unwrap_or_default();

    let raw = String::from_utf8_lossy(&response.body).trim().to_string();
    let details = match serde_json::from_slice::<Value>(&response.body) {
        Ok(Value::Object(object)) => object
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(raw.clone())),
        Ok(Value::String(text)) => Some(text),
        _ if raw.is_empty() => None,
        _ => Some(raw.clone()),
    };

    let message = if status_text.is_empty() {
        format!("HTTP {} error", response.status)
    } else {
        status_text.clone()
    };

    MailgunError::Api {
        status: response.status,
        status_text,
        message,
        details,
    }
}
