//! Integration tests using WireMock
//!
//! These tests drive `MailgunClient` against a mock HTTP server and check the
//! full request/response cycle: paths, authentication, encodings and error
//! mapping.

mod gateway;
mod suppressions;

use integrations_mailgun::MailgunClient;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

/// `Authorization` value for `api:test-key`.
pub const AUTH_HEADER: &str = "Basic YXBpOnRlc3Qta2V5";

/// Helper to start a mock server
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Helper to build a client pointed at the mock server
pub fn client_for(server: &MockServer) -> MailgunClient {
    MailgunClient::builder()
        .username("api")
        .key("test-key")
        .url(server.uri())
        .no_retry()
        .build()
        .expect("Failed to build client")
}

/// Helper to create an authenticated mock
pub fn mock_with_auth(path_matcher: &str, method_matcher: &str) -> MockBuilder {
    Mock::given(method(method_matcher))
        .and(path(path_matcher))
        .and(header("Authorization", AUTH_HEADER))
}

/// Helper to create success response templates
pub fn success_response(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

/// Helper to create error response templates
pub fn error_response(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(serde_json::json!({ "message": message }))
}
