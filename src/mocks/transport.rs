//! Mock transport for testing.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::errors::{MailgunError, MailgunResult};
use crate::transport::{HttpRequest, HttpResponse, Method, RequestBody, Transport};

/// A recorded request for verification.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: Method,
    /// Request URL.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body, raw or multipart.
    pub body: Option<RequestBody>,
}

impl RecordedRequest {
    /// Parses a raw body as JSON.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        match &self.body {
            Some(RequestBody::Raw(bytes)) => serde_json::from_slice(bytes).ok(),
            _ => None,
        }
    }
}

/// A mock response to return.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Bytes,
}

impl MockResponse {
    /// Creates a successful JSON response.
    pub fn json(body: serde_json::Value) -> Self {
        Self::json_with_status(200, body)
    }

    /// Creates a JSON response with the given status.
    pub fn json_with_status(status: u16, body: serde_json::Value) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self {
            status,
            headers,
            body: Bytes::from(body.to_string()),
        }
    }

    /// Creates a plain text response.
    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    /// Creates an error response shaped like the Mailgun API's.
    pub fn error(status: u16, message: &str) -> Self {
        Self::json_with_status(status, serde_json::json!({ "message": message }))
    }
}

enum Outcome {
    Response(MockResponse),
    Failure(MailgunError),
}

/// Mock transport for testing.
pub struct MockTransport {
    outcomes: Arc<Mutex<VecDeque<Outcome>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a response to the queue.
    pub fn enqueue_response(&self, response: MockResponse) {
        self.lock_outcomes().push_back(Outcome::Response(response));
    }

    /// Adds a transport failure to the queue.
    pub fn enqueue_failure(&self, error: MailgunError) {
        self.lock_outcomes().push_back(Outcome::Failure(error));
    }

    /// Gets all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.lock_requests().clone()
    }

    /// Gets the last recorded request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.lock_requests().last().cloned()
    }

    /// Returns the number of requests made.
    pub fn request_count(&self) -> usize {
        self.lock_requests().len()
    }

    fn lock_outcomes(&self) -> std::sync::MutexGuard<'_, VecDeque<Outcome>> {
        self.outcomes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_requests(&self) -> std::sync::MutexGuard<'_, Vec<RecordedRequest>> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> MailgunResult<HttpResponse> {
        self.lock_requests().push(RecordedRequest {
            method: request.method,
            url: request.url,
            headers: request.headers,
            body: request.body,
        });

        match self.lock_outcomes().pop_front() {
            Some(Outcome::Response(response)) => Ok(HttpResponse {
                status: response.status,
                status_text: None,
                headers: response.headers,
                body: response.body,
            }),
            Some(Outcome::Failure(error)) => Err(error),
            None => Err(MailgunError::Connection {
                message: "No mock response queued".to_string(),
            }),
        }
    }
}
