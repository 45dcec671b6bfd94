//! Integration tests for the request gateway and transport

use super::*;
use integrations_mailgun::resilience::RetryConfig;
use integrations_mailgun::RequestOptions;
use serde_json::{json, Value};
use std::time::Duration;

fn retrying_client(server: &MockServer) -> MailgunClient {
    MailgunClient::builder()
        .key("test-key")
        .url(server.uri())
        .retry(RetryConfig {
            initial_backoff: Duration::from_millis(1),
            ..Default::default()
        })
        .build()
        .expect("Failed to build client")
}

#[tokio::test]
async fn test_default_headers_are_sent() {
    let mock_server = setup_mock_server().await;

    mock_with_auth("/v3/domains", "GET")
        .and(wiremock::matchers::header("X-Mailgun-Test", "yes"))
        .respond_with(success_response(json!({ "items": [] })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = MailgunClient::builder()
        .key("test-key")
        .url(mock_server.uri())
        .header("X-Mailgun-Test", "yes")
        .build()
        .unwrap();

    let response = client.request().get("v3/domains", &[]).await.unwrap();
    assert_eq!(response.body, json!({ "items": [] }));
}

#[tokio::test]
async fn test_get_is_retried_after_service_unavailable() {
    let mock_server = setup_mock_server().await;

    mock_with_auth("/v3/example.com/bounces", "GET")
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mock_with_auth("/v3/example.com/bounces", "GET")
        .respond_with(success_response(json!({ "items": [] })))
        .mount(&mock_server)
        .await;

    let response = retrying_client(&mock_server)
        .request()
        .get("v3/example.com/bounces", &[])
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_post_is_not_retried() {
    let mock_server = setup_mock_server().await;

    mock_with_auth("/v3/example.com/bounces", "POST")
        .respond_with(error_response(503, "Service Unavailable"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let error = retrying_client(&mock_server)
        .request()
        .post("v3/example.com/bounces", "[]", RequestOptions::json())
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(503));
}

#[tokio::test]
async fn test_retry_after_above_cap_is_not_retried() {
    let mock_server = setup_mock_server().await;

    mock_with_auth("/v3/example.com/bounces", "GET")
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "3600"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let error = retrying_client(&mock_server)
        .request()
        .get("v3/example.com/bounces", &[])
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(429));
    assert_eq!(error.status_text(), Some("Too Many Requests"));
}

#[tokio::test]
async fn test_empty_body_parses_to_null() {
    let mock_server = setup_mock_server().await;

    mock_with_auth("/v3/example.com/tags/old", "DELETE")
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let response = client_for(&mock_server)
        .request()
        .delete("v3/example.com/tags/old", None)
        .await
        .unwrap();

    assert_eq!(response.body, Value::Null);
}
