//! Suppression types.
//!
//! Covers the four suppression kinds (bounces, complaints, unsubscribes and
//! whitelist entries), the records the API returns for each, and the
//! payloads accepted when creating them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::common::{deserialize_code, deserialize_timestamp};
use crate::errors::{MailgunError, MailgunResult};
use crate::pagination::{ListPage, ParsedPage};
use crate::request::ApiResponse;
use crate::transport::FormData;

/// The kind of a suppression list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuppressionType {
    /// Hard bounces.
    Bounces,
    /// Spam complaints.
    Complaints,
    /// Unsubscribed recipients.
    Unsubscribes,
    /// Addresses and domains that are never suppressed.
    Whitelists,
}

impl SuppressionType {
    /// All kinds, in path order.
    pub const ALL: [SuppressionType; 4] = [
        SuppressionType::Bounces,
        SuppressionType::Complaints,
        SuppressionType::Unsubscribes,
        SuppressionType::Whitelists,
    ];

    /// Returns the path segment for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SuppressionType::Bounces => "bounces",
            SuppressionType::Complaints => "complaints",
            SuppressionType::Unsubscribes => "unsubscribes",
            SuppressionType::Whitelists => "whitelists",
        }
    }
}

impl fmt::Display for SuppressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuppressionType {
    type Err = MailgunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SuppressionType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                MailgunError::invalid_request(
                    "Unknown type value",
                    "Type may be only one of [bounces, complaints, unsubscribes, whitelists]",
                )
            })
    }
}

/// A bounced address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Bounce {
    /// Email address.
    pub address: String,
    /// SMTP error code.
    #[serde(default, deserialize_with = "deserialize_code")]
    pub code: Option<u16>,
    /// SMTP error text.
    #[serde(default)]
    pub error: Option<String>,
    /// When the bounce was recorded.
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// An address that reported a message as spam.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Complaint {
    /// Email address.
    pub address: String,
    /// When the complaint was recorded.
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// An unsubscribed address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Unsubscribe {
    /// Email address.
    pub address: String,
    /// Tags the address is unsubscribed from; `*` means all.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// When the unsubscribe was recorded.
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A whitelisted address or domain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WhiteList {
    /// Whitelisted address or domain.
    pub value: String,
    /// Why the entry was whitelisted.
    #[serde(default)]
    pub reason: Option<String>,
    /// When the entry was created.
    #[serde(rename = "createdAt", default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A record from one of the suppression lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suppression {
    /// A bounce record.
    Bounce(Bounce),
    /// A complaint record.
    Complaint(Complaint),
    /// An unsubscribe record.
    Unsubscribe(Unsubscribe),
    /// A whitelist record.
    WhiteList(WhiteList),
}

impl Suppression {
    /// Parses a record of the given kind.
    pub fn from_json(kind: SuppressionType, value: &Value) -> MailgunResult<Self> {
        fn parse<T: serde::de::DeserializeOwned>(value: &Value) -> MailgunResult<T> {
            T::deserialize(value).map_err(|e| MailgunError::deserialization(e, value))
        }

        Ok(match kind {
            SuppressionType::Bounces => Suppression::Bounce(parse(value)?),
            SuppressionType::Complaints => Suppression::Complaint(parse(value)?),
            SuppressionType::Unsubscribes => Suppression::Unsubscribe(parse(value)?),
            SuppressionType::Whitelists => Suppression::WhiteList(parse(value)?),
        })
    }

    /// Returns the list this record belongs to.
    pub fn kind(&self) -> SuppressionType {
        match self {
            Suppression::Bounce(_) => SuppressionType::Bounces,
            Suppression::Complaint(_) => SuppressionType::Complaints,
            Suppression::Unsubscribe(_) => SuppressionType::Unsubscribes,
            Suppression::WhiteList(_) => SuppressionType::Whitelists,
        }
    }

    /// Returns the address, or the value of a whitelist entry.
    pub fn address_or_value(&self) -> &str {
        match self {
            Suppression::Bounce(b) => &b.address,
            Suppression::Complaint(c) => &c.address,
            Suppression::Unsubscribe(u) => &u.address,
            Suppression::WhiteList(w) => &w.value,
        }
    }

    /// Returns the creation time, if the API sent one.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Suppression::Bounce(b) => b.created_at,
            Suppression::Complaint(c) => c.created_at,
            Suppression::Unsubscribe(u) => u.created_at,
            Suppression::WhiteList(w) => w.created_at,
        }
    }
}

/// One page of a suppression list.
pub type SuppressionList = ListPage<Suppression>;

/// Query for listing suppressions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuppressionListQuery {
    /// Maximum number of records to return.
    pub limit: Option<u32>,
    /// Opaque page token from a previous response.
    pub page: Option<String>,
    /// Address cursor from a previous response.
    pub address: Option<String>,
}

impl SuppressionListQuery {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the page token.
    pub fn page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    /// Sets the address cursor.
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Builds the query that fetches a page from a previous response.
    ///
    /// Both cursors are copied from the link, along with its `limit` when
    /// the link carries one.
    pub fn from_page(page: &ParsedPage) -> Self {
        let limit = url::Url::parse(&page.url).ok().and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "limit")
                .and_then(|(_, value)| value.parse().ok())
        });

        Self {
            limit,
            page: page.page.clone(),
            address: page.address.clone(),
        }
    }

    /// Returns the query pairs to send.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(page) = &self.page {
            query.push(("page".to_string(), page.clone()));
        }
        if let Some(address) = &self.address {
            query.push(("address".to_string(), address.clone()));
        }
        query
    }
}

/// A `tag` value as the caller supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    /// A single tag.
    One(String),
    /// Several tags; only valid through `tags` on batch unsubscribes.
    Many(Vec<String>),
}

impl From<&str> for TagValue {
    fn from(tag: &str) -> Self {
        TagValue::One(tag.to_string())
    }
}

impl From<String> for TagValue {
    fn from(tag: String) -> Self {
        TagValue::One(tag)
    }
}

impl From<Vec<String>> for TagValue {
    fn from(tags: Vec<String>) -> Self {
        TagValue::Many(tags)
    }
}

/// Loose creation data accepted for every kind.
///
/// Which fields are allowed depends on the kind; see
/// [`SuppressionCreation::try_from_payload`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionCreationData {
    /// Email address.
    pub address: String,
    /// SMTP error code (bounces).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    /// SMTP error text (bounces).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Domain to whitelist (whitelists).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Single tag (one unsubscribe).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<TagValue>,
    /// Tags (batch unsubscribes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Creation time to record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl SuppressionCreationData {
    /// Creates data for an address.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Sets the bounce code.
    pub fn code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    /// Sets the bounce error text.
    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Sets the whitelisted domain.
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the tag.
    pub fn tag(mut self, tag: impl Into<TagValue>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Sets the tags.
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the creation time.
    pub fn created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }

    fn has_tag(&self) -> bool {
        match &self.tag {
            Some(TagValue::One(tag)) => !tag.is_empty(),
            Some(TagValue::Many(_)) => true,
            None => false,
        }
    }
}

/// One record or a batch of records to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationPayload {
    /// A single record.
    Single(SuppressionCreationData),
    /// Several records in one request.
    Batch(Vec<SuppressionCreationData>),
}

impl From<SuppressionCreationData> for CreationPayload {
    fn from(data: SuppressionCreationData) -> Self {
        CreationPayload::Single(data)
    }
}

impl From<Vec<SuppressionCreationData>> for CreationPayload {
    fn from(data: Vec<SuppressionCreationData>) -> Self {
        CreationPayload::Batch(data)
    }
}

/// Bounce to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BounceData {
    /// Email address.
    pub address: String,
    /// SMTP error code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    /// SMTP error text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Creation time to record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Complaint to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplaintData {
    /// Email address.
    pub address: String,
    /// Creation time to record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Unsubscribe to create as part of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsubscribeData {
    /// Email address.
    pub address: String,
    /// Tags to unsubscribe from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Creation time to record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// A single unsubscribe, sent as form data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SingleUnsubscribeData {
    /// Email address.
    pub address: String,
    /// Tag to unsubscribe from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Creation time to record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Whitelist entry to create, by address or by domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WhiteListData {
    /// Address to whitelist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Domain to whitelist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// How a creation request is put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationEncoding {
    /// JSON array body.
    Json,
    /// Multipart form fields.
    Multipart,
}

/// A validated creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuppressionCreation {
    /// One or more bounces.
    Bounces(Vec<BounceData>),
    /// One or more complaints.
    Complaints(Vec<ComplaintData>),
    /// A batch of unsubscribes.
    Unsubscribes(Vec<UnsubscribeData>),
    /// A single unsubscribe.
    Unsubscribe(SingleUnsubscribeData),
    /// A single whitelist entry.
    Whitelist(WhiteListData),
}

impl SuppressionCreation {
    /// Validates loose creation data against the rules of a kind.
    pub fn try_from_payload(kind: SuppressionType, payload: CreationPayload) -> MailgunResult<Self> {
        match kind {
            SuppressionType::Bounces => Ok(SuppressionCreation::Bounces(
                into_batch(payload)
                    .into_iter()
                    .map(|data| BounceData {
                        address: data.address,
                        code: data.code,
                        error: data.error,
                        created_at: data.created_at,
                    })
                    .collect(),
            )),
            SuppressionType::Complaints => Ok(SuppressionCreation::Complaints(
                into_batch(payload)
                    .into_iter()
                    .map(|data| ComplaintData {
                        address: data.address,
                        created_at: data.created_at,
                    })
                    .collect(),
            )),
            SuppressionType::Unsubscribes => Self::unsubscribes(payload),
            SuppressionType::Whitelists => match payload {
                CreationPayload::Batch(_) => Err(MailgunError::invalid_request(
                    "Data property should be an object",
                    "Whitelist's creation process does not support multiple creations. Data property should be an object",
                )),
                CreationPayload::Single(data) => Ok(SuppressionCreation::Whitelist(WhiteListData {
                    address: Some(data.address).filter(|address| !address.is_empty()),
                    domain: data.domain,
                })),
            },
        }
    }

    fn unsubscribes(payload: CreationPayload) -> MailgunResult<Self> {
        match payload {
            CreationPayload::Batch(items) => {
                if items.iter().any(SuppressionCreationData::has_tag) {
                    return Err(MailgunError::invalid_request(
                        "Tag property should not be used for creating multiple unsubscribes.",
                        "Tag property can be used only if one unsubscribe provided as second argument of create method. Please use tags instead.",
                    ));
                }
                Ok(SuppressionCreation::Unsubscribes(
                    items
                        .into_iter()
                        .map(|data| UnsubscribeData {
                            address: data.address,
                            tags: data.tags,
                            created_at: data.created_at,
                        })
                        .collect(),
                ))
            }
            CreationPayload::Single(data) => {
                if data.tags.is_some() {
                    return Err(MailgunError::invalid_request(
                        "Tags property should not be used for creating one unsubscribe.",
                        "Tags property can be used if you provides an array of unsubscribes as second argument of create method. Please use tag instead",
                    ));
                }
                let tag = match data.tag {
                    Some(TagValue::Many(_)) => {
                        return Err(MailgunError::invalid_request(
                            "Tag property can not be an array",
                            "Please use array of unsubscribes as second argument of create method to be able to provide few tags",
                        ))
                    }
                    Some(TagValue::One(tag)) => Some(tag),
                    None => None,
                };
                Ok(SuppressionCreation::Unsubscribe(SingleUnsubscribeData {
                    address: data.address,
                    tag,
                    created_at: data.created_at,
                }))
            }
        }
    }

    /// Returns the list this request creates records in.
    pub fn kind(&self) -> SuppressionType {
        match self {
            SuppressionCreation::Bounces(_) => SuppressionType::Bounces,
            SuppressionCreation::Complaints(_) => SuppressionType::Complaints,
            SuppressionCreation::Unsubscribes(_) | SuppressionCreation::Unsubscribe(_) => {
                SuppressionType::Unsubscribes
            }
            SuppressionCreation::Whitelist(_) => SuppressionType::Whitelists,
        }
    }

    /// Returns how the request is encoded.
    ///
    /// Single unsubscribes go as form data because the JSON endpoint ignores
    /// `tag`.
    pub fn encoding(&self) -> CreationEncoding {
        match self {
            SuppressionCreation::Bounces(_)
            | SuppressionCreation::Complaints(_)
            | SuppressionCreation::Unsubscribes(_) => CreationEncoding::Json,
            SuppressionCreation::Unsubscribe(_) | SuppressionCreation::Whitelist(_) => {
                CreationEncoding::Multipart
            }
        }
    }

    /// Serializes a JSON-encoded request to its array body.
    pub(crate) fn to_json(&self) -> MailgunResult<String> {
        Ok(match self {
            SuppressionCreation::Bounces(items) => serde_json::to_string(items)?,
            SuppressionCreation::Complaints(items) => serde_json::to_string(items)?,
            SuppressionCreation::Unsubscribes(items) => serde_json::to_string(items)?,
            SuppressionCreation::Unsubscribe(data) => serde_json::to_string(&[data])?,
            SuppressionCreation::Whitelist(data) => serde_json::to_string(&[data])?,
        })
    }

    /// Converts a multipart-encoded request to form fields.
    pub(crate) fn to_form(&self) -> MailgunResult<FormData> {
        match self {
            SuppressionCreation::Unsubscribe(data) => FormData::from_serializable(data),
            SuppressionCreation::Whitelist(data) => FormData::from_serializable(data),
            other => Err(MailgunError::Serialization {
                message: format!("{} creation is not sent as form data", other.kind()),
            }),
        }
    }
}

fn into_batch(payload: CreationPayload) -> Vec<SuppressionCreationData> {
    match payload {
        CreationPayload::Single(data) => vec![data],
        CreationPayload::Batch(items) => items,
    }
}

/// Result of a create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuppressionCreationResult {
    /// Server message.
    pub message: String,
    /// Echoed record type, or empty.
    #[serde(rename = "type")]
    pub kind: String,
    /// Echoed value, or empty.
    pub value: String,
    /// HTTP status.
    pub status: u16,
}

impl From<ApiResponse> for SuppressionCreationResult {
    fn from(response: ApiResponse) -> Self {
        Self {
            message: string_field(&response.body, "message"),
            kind: string_field(&response.body, "type"),
            value: string_field(&response.body, "value"),
            status: response.status,
        }
    }
}

/// Result of a destroy call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuppressionDestroyResult {
    /// Server message.
    pub message: String,
    /// Echoed value, or empty.
    pub value: String,
    /// Echoed address, or empty.
    pub address: String,
    /// HTTP status.
    pub status: u16,
}

impl From<ApiResponse> for SuppressionDestroyResult {
    fn from(response: ApiResponse) -> Self {
        Self {
            message: string_field(&response.body, "message"),
            value: string_field(&response.body, "value"),
            address: string_field(&response.body, "address"),
            status: response.status,
        }
    }
}

fn string_field(body: &Value, name: &str) -> String {
    body.get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
