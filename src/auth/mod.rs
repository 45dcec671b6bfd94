//! Authentication module for the Mailgun client.
//!
//! Every request carries HTTP Basic credentials built from the configured
//! username and key.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;

/// Name of the authorization header.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Trait for authentication managers.
pub trait AuthManager: Send + Sync {
    /// Returns the authentication and default headers.
    fn get_headers(&self) -> HashMap<String, String>;
}

/// HTTP Basic authentication manager.
pub struct BasicAuthManager {
    username: String,
    key: SecretString,
    default_headers: Vec<(String, String)>,
}

impl BasicAuthManager {
    /// Creates a new basic auth manager.
    pub fn new(
        username: impl Into<String>,
        key: impl Into<String>,
        default_headers: Vec<(String, String)>,
    ) -> Self {
        Self {
            username: username.into(),
            key: SecretString::new(key.into()),
            default_headers,
        }
    }

    /// Returns the `Authorization` header value.
    pub fn authorization(&self) -> String {
        let credentials = format!("{}:{}", self.username, self.key.expose_secret());
        format!("Basic {}", STANDARD.encode(credentials))
    }
}

impl AuthManager for BasicAuthManager {
    fn get_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();

        headers.insert(AUTHORIZATION_HEADER.to_string(), self.authorization());

        // Configured headers may override the defaults above.
        for (key, value) in &self.default_headers {
            headers.insert(key.clone(), value.clone());
        }

        headers
    }
}

impl std::fmt::Debug for BasicAuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthManager")
            .field("username", &self.username)
            .field("key", &"[REDACTED]")
            .field("default_headers", &self.default_headers.len())
            .finish()
    }
}
