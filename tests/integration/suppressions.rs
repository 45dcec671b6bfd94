//! Integration tests for suppressions

use super::*;
use integrations_mailgun::{
    MailgunError, SuppressionCreationData, SuppressionListQuery, SuppressionType,
    SuppressionsService,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, query_param};

#[tokio::test]
async fn test_list_bounces_with_paging() {
    let mock_server = setup_mock_server().await;
    let next = format!(
        "{}/v3/example.com/bounces?page=next&address=b%40example.com&limit=2",
        mock_server.uri()
    );

    mock_with_auth("/v3/example.com/bounces", "GET")
        .and(query_param("limit", "2"))
        .respond_with(success_response(json!({
            "items": [
                {
                    "address": "a@example.com",
                    "code": "550",
                    "error": "No such mailbox",
                    "created_at": "Fri, 21 Oct 2011 11:02:55 GMT"
                },
                {
                    "address": "b@example.com",
                    "code": 421,
                    "error": "Try later",
                    "created_at": "Fri, 21 Oct 2011 12:00:00 GMT"
                }
            ],
            "paging": { "next": next }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let page = client
        .suppressions()
        .list(
            "example.com",
            "bounces",
            Some(SuppressionListQuery::new().limit(2)),
        )
        .await
        .unwrap();

    assert_eq!(page.status, 200);
    assert_eq!(page.items.len(), 2);
    assert!(page.items.iter().all(|r| r.kind() == SuppressionType::Bounces));
    assert_eq!(page.items[1].address_or_value(), "b@example.com");

    let next = page.pages.next().unwrap();
    assert_eq!(next.page.as_deref(), Some("next"));
    assert_eq!(next.address.as_deref(), Some("b@example.com"));
}

#[tokio::test]
async fn test_get_uses_encoded_address() {
    let mock_server = setup_mock_server().await;

    mock_with_auth("/v3/example.com/bounces/a%2Bb%40example.com", "GET")
        .respond_with(success_response(json!({
            "address": "a+b@example.com",
            "code": 550,
            "error": "Rejected",
            "created_at": "Fri, 21 Oct 2011 11:02:55 GMT"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let record = client_for(&mock_server)
        .suppressions()
        .get("example.com", "bounces", "a+b@example.com")
        .await
        .unwrap();

    assert_eq!(record.address_or_value(), "a+b@example.com");
}

#[tokio::test]
async fn test_create_bounce_sends_json_array() {
    let mock_server = setup_mock_server().await;

    mock_with_auth("/v3/example.com/bounces", "POST")
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!([{ "address": "a@example.com", "code": 550 }])))
        .respond_with(success_response(json!({
            "message": "1 addresses have been added to the bounces table"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server)
        .suppressions()
        .create(
            "example.com",
            "bounces",
            SuppressionCreationData::new("a@example.com").code(550).into(),
        )
        .await
        .unwrap();

    assert_eq!(result.status, 200);
    assert_eq!(result.message, "1 addresses have been added to the bounces table");
    assert_eq!(result.kind, "");
}

#[tokio::test]
async fn test_create_single_unsubscribe_sends_form_fields() {
    let mock_server = setup_mock_server().await;

    mock_with_auth("/v3/example.com/unsubscribes", "POST")
        .respond_with(success_response(json!({
            "message": "Address has been added to the unsubscribes table",
            "address": "a@example.com"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    client_for(&mock_server)
        .suppressions()
        .create(
            "example.com",
            "unsubscribes",
            SuppressionCreationData::new("a@example.com").tag("news").into(),
        )
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("multipart/form-data"));

    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"address\""));
    assert!(body.contains("a@example.com"));
    assert!(body.contains("name=\"tag\""));
    assert!(body.contains("news"));
}

#[tokio::test]
async fn test_whitelist_batch_never_reaches_server() {
    let mock_server = setup_mock_server().await;

    let error = client_for(&mock_server)
        .suppressions()
        .create(
            "example.com",
            "whitelists",
            vec![SuppressionCreationData::new("a@example.com")].into(),
        )
        .await
        .unwrap_err();

    assert!(error.is_local());
    assert_eq!(error.status(), Some(400));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_destroy_unsubscribe() {
    let mock_server = setup_mock_server().await;

    mock_with_auth("/v3/example.com/unsubscribes/user%40example.com", "DELETE")
        .respond_with(success_response(json!({
            "message": "Unsubscribe event has been removed",
            "address": "user@example.com"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server)
        .suppressions()
        .destroy("example.com", "unsubscribes", "user@example.com")
        .await
        .unwrap();

    assert_eq!(result.address, "user@example.com");
    assert_eq!(result.value, "");
    assert_eq!(result.status, 200);
}

#[tokio::test]
async fn test_not_found_maps_to_api_error() {
    let mock_server = setup_mock_server().await;

    mock_with_auth("/v3/example.com/complaints/nobody%40example.com", "GET")
        .respond_with(error_response(404, "No spam complaints found for this address"))
        .mount(&mock_server)
        .await;

    let error = client_for(&mock_server)
        .suppressions()
        .get("example.com", "complaints", "nobody@example.com")
        .await
        .unwrap_err();

    match error {
        MailgunError::Api {
            status,
            status_text,
            details,
            ..
        } => {
            assert_eq!(status, 404);
            assert_eq!(status_text, "Not Found");
            assert_eq!(
                details.as_deref(),
                Some("No spam complaints found for this address")
            );
        }
        other => panic!("expected an API error, got {:?}", other),
    }
}
