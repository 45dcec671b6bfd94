//! Suppressions service.

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::{MailgunError, MailgunResult};
use crate::pagination::{PageNavigator, PageParams};
use crate::request::{encode_path_segment, RequestGateway, RequestOptions};
use crate::types::suppressions::{
    CreationEncoding, CreationPayload, Suppression, SuppressionCreation,
    SuppressionCreationResult, SuppressionDestroyResult, SuppressionList, SuppressionListQuery,
    SuppressionType,
};

/// Suppressions service trait.
///
/// `kind` is one of `bounces`, `complaints`, `unsubscribes` or `whitelists`.
/// Any other value fails with a local validation error before a request is
/// sent.
#[async_trait]
pub trait SuppressionsService: Send + Sync {
    /// Lists one page of a suppression list.
    async fn list(
        &self,
        domain: &str,
        kind: &str,
        query: Option<SuppressionListQuery>,
    ) -> MailgunResult<SuppressionList>;

    /// Retrieves the record for an address.
    async fn get(&self, domain: &str, kind: &str, address: &str) -> MailgunResult<Suppression>;

    /// Validates and creates one or more records.
    async fn create(
        &self,
        domain: &str,
        kind: &str,
        payload: CreationPayload,
    ) -> MailgunResult<SuppressionCreationResult>;

    /// Creates records from an already validated request.
    async fn create_typed(
        &self,
        domain: &str,
        creation: SuppressionCreation,
    ) -> MailgunResult<SuppressionCreationResult>;

    /// Removes an address from a suppression list.
    async fn destroy(
        &self,
        domain: &str,
        kind: &str,
        address: &str,
    ) -> MailgunResult<SuppressionDestroyResult>;
}

/// Default implementation of the suppressions service.
#[derive(Debug, Clone)]
pub struct DefaultSuppressionsService {
    request: Arc<RequestGateway>,
    pages: PageNavigator,
}

impl DefaultSuppressionsService {
    /// Creates a new suppressions service.
    pub fn new(request: Arc<RequestGateway>) -> Self {
        Self {
            pages: PageNavigator::new(request.clone(), PageParams::SUPPRESSIONS),
            request,
        }
    }
}

fn parse_kind(kind: &str) -> MailgunResult<SuppressionType> {
    kind.parse::<SuppressionType>().map_err(|error| {
        tracing::debug!(kind, "Rejected unknown suppression type");
        error
    })
}

fn list_path(domain: &str, kind: SuppressionType) -> String {
    format!("v3/{}/{}", domain, kind)
}

/// Path of a single record.
///
/// URL parsing resolves `.` and `..` segments (encoded or not), and an empty
/// segment addresses the list itself, so those addresses are rejected.
fn record_path(domain: &str, kind: SuppressionType, address: &str) -> MailgunResult<String> {
    if matches!(address, "" | "." | "..") {
        tracing::debug!(kind = %kind, address, "Rejected suppression address");
        return Err(MailgunError::invalid_request(
            "Invalid address value",
            "Address must not be empty, \".\" or \"..\"",
        ));
    }
    Ok(format!("v3/{}/{}/{}", domain, kind, encode_path_segment(address)))
}

#[async_trait]
impl SuppressionsService for DefaultSuppressionsService {
    async fn list(
        &self,
        domain: &str,
        kind: &str,
        query: Option<SuppressionListQuery>,
    ) -> MailgunResult<SuppressionList> {
        let kind = parse_kind(kind)?;
        let query = query.map(|q| q.to_query()).unwrap_or_default();

        self.pages
            .request_list_with_pages(&list_path(domain, kind), &query, |item| {
                Suppression::from_json(kind, item)
            })
            .await
    }

    async fn get(&self, domain: &str, kind: &str, address: &str) -> MailgunResult<Suppression> {
        let kind = parse_kind(kind)?;
        let response = self
            .request
            .get(&record_path(domain, kind, address)?, &[])
            .await?;

        Suppression::from_json(kind, &response.body)
    }

    async fn create(
        &self,
        domain: &str,
        kind: &str,
        payload: CreationPayload,
    ) -> MailgunResult<SuppressionCreationResult> {
        let kind = parse_kind(kind)?;
        let creation = SuppressionCreation::try_from_payload(kind, payload).map_err(|error| {
            if let MailgunError::InvalidRequest { status_text, .. } = &error {
                tracing::debug!(kind = %kind, reason = %status_text, "Rejected suppression creation");
            }
            error
        })?;

        self.create_typed(domain, creation).await
    }

    async fn create_typed(
        &self,
        domain: &str,
        creation: SuppressionCreation,
    ) -> MailgunResult<SuppressionCreationResult> {
        let path = list_path(domain, creation.kind());

        let response = match creation.encoding() {
            CreationEncoding::Json => {
                self.request
                    .post(&path, creation.to_json()?, RequestOptions::json())
                    .await?
            }
            CreationEncoding::Multipart => {
                self.request
                    .post_with_fd(&path, &creation.to_form()?)
                    .await?
            }
        };

        Ok(SuppressionCreationResult::from(response))
    }

    async fn destroy(
        &self,
        domain: &str,
        kind: &str,
        address: &str,
    ) -> MailgunResult<SuppressionDestroyResult> {
        let kind = parse_kind(kind)?;
        let response = self
            .request
            .delete(&record_path(domain, kind, address)?, None)
            .await?;

        Ok(SuppressionDestroyResult::from(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MailgunConfig;
    use crate::mocks::{MockResponse, MockTransport};
    use crate::transport::{Method, RequestBody};
    use crate::types::suppressions::SuppressionCreationData;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use test_case::test_case;

    const BASE: &str = "https://api.mailgun.net/v3/example.com";

    fn service() -> (DefaultSuppressionsService, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let config = MailgunConfig::builder()
            .username("api")
            .key("test-key")
            .build()
            .unwrap();
        let gateway = RequestGateway::with_transport(&config, transport.clone());
        (DefaultSuppressionsService::new(Arc::new(gateway)), transport)
    }

    fn item(kind: SuppressionType, n: usize) -> Value {
        let address = format!("user{}@example.com", n);
        match kind {
            SuppressionType::Bounces => json!({
                "address": address,
                "code": "550",
                "error": "No such mailbox",
                "created_at": "Fri, 21 Oct 2011 11:02:55 GMT"
            }),
            SuppressionType::Complaints => json!({
                "address": address,
                "created_at": "Fri, 21 Oct 2011 11:02:55 GMT"
            }),
            SuppressionType::Unsubscribes => json!({
                "address": address,
                "tags": ["*"],
                "created_at": "Fri, 21 Oct 2011 11:02:55 GMT"
            }),
            SuppressionType::Whitelists => json!({
                "value": address,
                "reason": "manual",
                "createdAt": "Fri, 21 Oct 2011 11:02:55 GMT"
            }),
        }
    }

    #[test_case(SuppressionType::Bounces ; "bounces")]
    #[test_case(SuppressionType::Complaints ; "complaints")]
    #[test_case(SuppressionType::Unsubscribes ; "unsubscribes")]
    #[test_case(SuppressionType::Whitelists ; "whitelists")]
    #[tokio::test]
    async fn test_list_yields_records_of_kind_in_order(kind: SuppressionType) {
        let (service, transport) = service();
        transport.enqueue_response(MockResponse::json(json!({
            "items": [item(kind, 1), item(kind, 2)],
            "paging": {
                "next": format!("{}/{}?page=next&address=user2%40example.com", BASE, kind),
                "first": format!("{}/{}?page=first", BASE, kind)
            }
        })));

        let list = service
            .list("example.com", kind.as_str(), Some(SuppressionListQuery::new().limit(2)))
            .await
            .unwrap();

        assert_eq!(list.status, 200);
        assert_eq!(list.items.len(), 2);
        assert!(list.items.iter().all(|record| record.kind() == kind));
        assert_eq!(list.items[0].address_or_value(), "user1@example.com");
        assert_eq!(list.items[1].address_or_value(), "user2@example.com");

        let next = list.pages.next().unwrap();
        assert_eq!(next.page.as_deref(), Some("next"));
        assert_eq!(next.address.as_deref(), Some("user2@example.com"));
        assert_eq!(list.pages.first().unwrap().address, None);

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.url, format!("{}/{}?limit=2", BASE, kind));
    }

    #[tokio::test]
    async fn test_list_keeps_records_missing_optional_fields() {
        let (service, transport) = service();
        transport.enqueue_response(MockResponse::json(json!({
            "items": [
                item(SuppressionType::Bounces, 1),
                {"address": "user2@example.com", "code": 550}
            ]
        })));

        let list = service.list("example.com", "bounces", None).await.unwrap();

        assert_eq!(list.items.len(), 2);
        let Suppression::Bounce(second) = &list.items[1] else {
            panic!("expected a bounce, got {:?}", list.items[1]);
        };
        assert_eq!(second.address, "user2@example.com");
        assert_eq!(second.code, Some(550));
        assert_eq!(second.error, None);
    }

    #[tokio::test]
    async fn test_list_follows_next_page_with_both_cursors() {
        let (service, transport) = service();
        transport.enqueue_response(MockResponse::json(json!({
            "items": [item(SuppressionType::Bounces, 1)],
            "paging": {
                "next": format!("{}/bounces?page=next&address=z%40example.com&limit=2", BASE)
            }
        })));
        transport.enqueue_response(MockResponse::json(json!({"items": []})));

        let first = service
            .list("example.com", "bounces", Some(SuppressionListQuery::new().limit(2)))
            .await
            .unwrap();
        let next = SuppressionListQuery::from_page(first.pages.next().unwrap());
        service.list("example.com", "bounces", Some(next)).await.unwrap();

        assert_eq!(
            transport.last_request().unwrap().url,
            format!("{}/bounces?limit=2&page=next&address=z%40example.com", BASE)
        );
    }

    #[tokio::test]
    async fn test_list_without_items_is_empty() {
        let (service, transport) = service();
        transport.enqueue_response(MockResponse::json(json!({"paging": {}})));

        let list = service.list("example.com", "bounces", None).await.unwrap();

        assert!(list.items.is_empty());
        assert!(list.pages.is_empty());
    }

    #[tokio::test]
    async fn test_list_is_repeatable() {
        let (service, transport) = service();
        let body = json!({"items": [item(SuppressionType::Complaints, 1)]});
        transport.enqueue_response(MockResponse::json(body.clone()));
        transport.enqueue_response(MockResponse::json(body));

        let first = service.list("example.com", "complaints", None).await.unwrap();
        let second = service.list("example.com", "complaints", None).await.unwrap();

        assert_eq!(first, second);
        let requests = transport.get_requests();
        assert_eq!(requests[0].url, requests[1].url);
    }

    #[test_case("list" ; "list")]
    #[test_case("get" ; "get")]
    #[test_case("create" ; "create")]
    #[test_case("destroy" ; "destroy")]
    #[tokio::test]
    async fn test_unknown_kind_rejects_before_request(operation: &str) {
        let (service, transport) = service();
        let domain = "example.com";

        let error = match operation {
            "list" => service.list(domain, "spam", None).await.map(|_| ()),
            "get" => service.get(domain, "spam", "a@example.com").await.map(|_| ()),
            "create" => service
                .create(domain, "spam", SuppressionCreationData::new("a@example.com").into())
                .await
                .map(|_| ()),
            _ => service.destroy(domain, "spam", "a@example.com").await.map(|_| ()),
        }
        .unwrap_err();

        assert!(error.is_local());
        assert_eq!(error.status(), Some(400));
        assert_eq!(error.status_text(), Some("Unknown type value"));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_get_encodes_address() {
        let (service, transport) = service();
        transport.enqueue_response(MockResponse::json(item(SuppressionType::Bounces, 1)));

        let record = service
            .get("example.com", "bounces", "a+b@example.com")
            .await
            .unwrap();

        assert_eq!(record.kind(), SuppressionType::Bounces);
        let request = transport.last_request().unwrap();
        assert_eq!(request.url, format!("{}/bounces/a%2Bb%40example.com", BASE));

        let segment = request.url.rsplit('/').next().unwrap();
        let decoded = percent_encoding::percent_decode_str(segment)
            .decode_utf8()
            .unwrap();
        assert_eq!(decoded, "a+b@example.com");
    }

    #[test_case("" ; "empty")]
    #[test_case("." ; "dot")]
    #[test_case(".." ; "double dot")]
    #[tokio::test]
    async fn test_unaddressable_address_rejects_before_request(address: &str) {
        let (service, transport) = service();

        let get = service.get("example.com", "bounces", address).await.unwrap_err();
        let destroy = service
            .destroy("example.com", "bounces", address)
            .await
            .unwrap_err();

        for error in [get, destroy] {
            assert!(error.is_local());
            assert_eq!(error.status_text(), Some("Invalid address value"));
        }
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_dotted_address_is_kept_in_path() {
        let (service, transport) = service();
        transport.enqueue_response(MockResponse::json(json!({"message": "ok"})));

        service
            .destroy("example.com", "bounces", "...")
            .await
            .unwrap();

        assert_eq!(
            transport.last_request().unwrap().url,
            format!("{}/bounces/...", BASE)
        );
    }

    #[tokio::test]
    async fn test_get_propagates_api_error() {
        let (service, transport) = service();
        transport.enqueue_response(MockResponse::error(404, "Address not found in bounces table"));

        let error = service
            .get("example.com", "bounces", "missing@example.com")
            .await
            .unwrap_err();

        assert!(!error.is_local());
        assert_eq!(error.status(), Some(404));
        assert_eq!(error.details(), Some("Address not found in bounces table"));
    }

    #[tokio::test]
    async fn test_create_single_bounce_sends_json_array() {
        let (service, transport) = service();
        transport.enqueue_response(MockResponse::json(json!({
            "message": "1 addresses have been added to the bounces table"
        })));

        let result = service
            .create(
                "example.com",
                "bounces",
                SuppressionCreationData::new("a@example.com")
                    .code(550)
                    .error("Mailbox full")
                    .into(),
            )
            .await
            .unwrap();

        assert_eq!(result.status, 200);
        assert_eq!(result.kind, "");
        assert_eq!(result.value, "");

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, format!("{}/bounces", BASE));
        assert_eq!(
            request.headers.get("Content-Type"),
            Some(&"application/json".to_string())
        );
        assert_eq!(
            request.json_body(),
            Some(json!([{"address": "a@example.com", "code": 550, "error": "Mailbox full"}]))
        );
    }

    #[tokio::test]
    async fn test_create_complaints_batch() {
        let (service, transport) = service();
        transport.enqueue_response(MockResponse::json(json!({"message": "ok"})));

        service
            .create(
                "example.com",
                "complaints",
                vec![
                    SuppressionCreationData::new("a@example.com"),
                    SuppressionCreationData::new("b@example.com"),
                ]
                .into(),
            )
            .await
            .unwrap();

        let body = transport.last_request().unwrap().json_body().unwrap();
        assert_eq!(body.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_create_whitelist_batch_rejects_locally() {
        let (service, transport) = service();

        let error = service
            .create(
                "example.com",
                "whitelists",
                vec![SuppressionCreationData::new("a@example.com")].into(),
            )
            .await
            .unwrap_err();

        assert_eq!(error.status_text(), Some("Data property should be an object"));
        assert_eq!(
            error.details(),
            Some("Whitelist's creation process does not support multiple creations. Data property should be an object")
        );
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_create_unsubscribe_batch_with_tag_rejects_locally() {
        let (service, transport) = service();

        let error = service
            .create(
                "example.com",
                "unsubscribes",
                vec![SuppressionCreationData::new("a@example.com").tag("news")].into(),
            )
            .await
            .unwrap_err();

        assert_eq!(
            error.details(),
            Some("Tag property can be used only if one unsubscribe provided as second argument of create method. Please use tags instead.")
        );
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_create_single_unsubscribe_with_tags_rejects_locally() {
        let (service, transport) = service();

        let error = service
            .create(
                "example.com",
                "unsubscribes",
                SuppressionCreationData::new("a@example.com").tags(["news"]).into(),
            )
            .await
            .unwrap_err();

        assert_eq!(
            error.details(),
            Some("Tags property can be used if you provides an array of unsubscribes as second argument of create method. Please use tag instead")
        );
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_create_single_unsubscribe_sends_form() {
        let (service, transport) = service();
        transport.enqueue_response(MockResponse::json(json!({
            "message": "Address has been added to the unsubscribes table",
            "address": "a@example.com"
        })));

        service
            .create(
                "example.com",
                "unsubscribes",
                SuppressionCreationData::new("a@example.com").tag("news").into(),
            )
            .await
            .unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.url, format!("{}/unsubscribes", BASE));
        let Some(RequestBody::Multipart(form)) = request.body else {
            panic!("expected multipart body");
        };
        assert_eq!(form.get("address"), Some("a@example.com"));
        assert_eq!(form.get("tag"), Some("news"));
    }

    #[tokio::test]
    async fn test_create_whitelist_sends_form() {
        let (service, transport) = service();
        transport.enqueue_response(MockResponse::json(json!({
            "message": "Address/Domain has been added to the allowlist",
            "type": "domain",
            "value": "example.org"
        })));

        let result = service
            .create(
                "example.com",
                "whitelists",
                SuppressionCreationData::default().domain("example.org").into(),
            )
            .await
            .unwrap();

        assert_eq!(result.kind, "domain");
        assert_eq!(result.value, "example.org");
        let request = transport.last_request().unwrap();
        assert!(matches!(request.body, Some(RequestBody::Multipart(_))));
    }

    #[tokio::test]
    async fn test_create_typed_skips_validation() {
        let (service, transport) = service();
        transport.enqueue_response(MockResponse::json(json!({"message": "ok"})));

        let creation = SuppressionCreation::Unsubscribes(vec![]);
        service.create_typed("example.com", creation).await.unwrap();

        assert_eq!(transport.last_request().unwrap().json_body(), Some(json!([])));
    }

    #[tokio::test]
    async fn test_destroy_projection() {
        let (service, transport) = service();
        transport.enqueue_response(MockResponse::json(json!({
            "message": "ok",
            "address": "user@example.com"
        })));

        let result = service
            .destroy("example.com", "unsubscribes", "user@example.com")
            .await
            .unwrap();

        assert_eq!(
            result,
            SuppressionDestroyResult {
                message: "ok".to_string(),
                value: String::new(),
                address: "user@example.com".to_string(),
                status: 200,
            }
        );
        let request = transport.last_request().unwrap();
        assert_eq!(request.method, Method::Delete);
        assert_eq!(request.url, format!("{}/unsubscribes/user%40example.com", BASE));
    }
}
