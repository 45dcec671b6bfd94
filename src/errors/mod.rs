//! Error types for the Mailgun client.
//!
//! Local validation failures, server rejections and transport failures all
//! share one enum. The accessors (`status`, `status_text`, `message`,
//! `details`) return the same shape for each of them, so callers can treat
//! every failure uniformly and still ask [`MailgunError::is_local`] whether a
//! request ever left the process.

use thiserror::Error;

/// Result type alias for Mailgun operations.
pub type MailgunResult<T> = Result<T, MailgunError>;

/// Status code carried by locally raised validation errors.
pub const LOCAL_VALIDATION_STATUS: u16 = 400;

/// Error type for Mailgun client operations.
#[derive(Debug, Error)]
pub enum MailgunError {
    /// The call was rejected locally; no request was sent.
    #[error("Invalid request: {status_text}")]
    InvalidRequest {
        /// Short reason, mirrors an HTTP status text.
        status_text: String,
        /// Human-readable explanation of how to fix the call.
        details: String,
    },

    /// The API answered with a non-2xx status.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// HTTP reason phrase.
        status_text: String,
        /// Error message.
        message: String,
        /// Message extracted from the response body, if any.
        details: Option<String>,
    },

    /// Request timeout.
    #[error("Request timeout: {message}")]
    Timeout {
        /// Error message.
        message: String,
    },

    /// Network/connection error.
    #[error("Connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// Configuration error (missing credentials, invalid base URL, etc.)
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// Request serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },

    /// Response deserialization error.
    #[error("Deserialization error: {message}")]
    Deserialization {
        /// Error message.
        message: String,
        /// Raw body that failed to parse.
        body: String,
    },
}

impl MailgunError {
    /// Creates a local validation error.
    pub fn invalid_request(status_text: impl Into<String>, details: impl Into<String>) -> Self {
        MailgunError::InvalidRequest {
            status_text: status_text.into(),
            details: details.into(),
        }
    }

    /// Creates a deserialization error for a value that did not match a record.
    pub fn deserialization(err: impl std::fmt::Display, body: &serde_json::Value) -> Self {
        MailgunError::Deserialization {
            message: err.to_string(),
            body: body.to_string(),
        }
    }

    /// Returns the HTTP status, if the error has one.
    ///
    /// Local validation errors report `400`; transport failures report `None`.
    pub fn status(&self) -> Option<u16> {
        match self {
            MailgunError::InvalidRequest { .. } => Some(LOCAL_VALIDATION_STATUS),
            MailgunError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the HTTP status text, if the error has one.
    pub fn status_text(&self) -> Option<&str> {
        match self {
            MailgunError::InvalidRequest { status_text, .. }
            | MailgunError::Api { status_text, .. } => Some(status_text),
            _ => None,
        }
    }

    /// Returns the primary error message.
    pub fn message(&self) -> &str {
        match self {
            MailgunError::InvalidRequest { status_text, .. } => status_text,
            MailgunError::Api { message, .. }
            | MailgunError::Timeout { message }
            | MailgunError::Connection { message }
            | MailgunError::Configuration { message }
            | MailgunError::Serialization { message }
            | MailgunError::Deserialization { message, .. } => message,
        }
    }

    /// Returns the detailed explanation, if any.
    pub fn details(&self) -> Option<&str> {
        match self {
            MailgunError::InvalidRequest { details, .. } => Some(details),
            MailgunError::Api { details, .. } => details.as_deref(),
            _ => None,
        }
    }

    /// Returns true if the error was raised before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            MailgunError::InvalidRequest { .. }
                | MailgunError::Configuration { .. }
                | MailgunError::Serialization { .. }
        )
    }

    /// Returns true if the error came from the transport itself.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            MailgunError::Timeout { .. } | MailgunError::Connection { .. }
        )
    }
}

impl From<reqwest::Error> for MailgunError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MailgunError::Timeout {
                message: err.to_string(),
            }
        } else {
            MailgunError::Connection {
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for MailgunError {
    fn from(err: serde_json::Error) -> Self {
        MailgunError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for MailgunError {
    fn from(err: url::ParseError) -> Self {
        MailgunError::Configuration {
            message: format!("Invalid URL: {}", err),
        }
    }
}
