//! Pagination handling for Mailgun list endpoints.
//!
//! List responses carry a `paging` object mapping a relation name
//! (`first`, `next`, `previous`, `last`) to a full URL. The cursor for each
//! relation lives in that URL's query string.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::MailgunResult;
use crate::request::RequestGateway;

/// Query parameter names holding the page cursors of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    /// Parameter carrying the opaque page token.
    pub cursor_param: &'static str,
    /// Parameter carrying the address cursor, if the resource has one.
    pub iterator_param: &'static str,
}

impl PageParams {
    /// Parameters used by the suppression endpoints.
    pub const SUPPRESSIONS: PageParams = PageParams {
        cursor_param: "page",
        iterator_param: "address",
    };
}

impl Default for PageParams {
    fn default() -> Self {
        Self::SUPPRESSIONS
    }
}

/// One parsed entry of a `paging` object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    /// Relation name, e.g. `next`.
    pub id: String,
    /// Opaque page token.
    pub page: Option<String>,
    /// Address cursor.
    pub address: Option<String>,
    /// The raw link.
    pub url: String,
}

impl ParsedPage {
    /// Parses a single paging link.
    pub fn parse(id: impl Into<String>, link: &str, params: PageParams) -> Self {
        let pairs = query_pairs(link);
        let find = |name: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        };

        Self {
            id: id.into(),
            page: find(params.cursor_param),
            address: find(params.iterator_param),
            url: link.to_string(),
        }
    }
}

/// Decoded query pairs of a link.
///
/// Relative links have no base to resolve against; their query is decoded
/// directly from the text after `?`.
fn query_pairs(link: &str) -> Vec<(String, String)> {
    if let Ok(url) = url::Url::parse(link) {
        return url.query_pairs().into_owned().collect();
    }

    match link.split_once('?') {
        Some((_, query)) => {
            let query = query.split('#').next().unwrap_or_default();
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect()
        }
        None => Vec::new(),
    }
}

/// Pagination links keyed by relation name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationLinks {
    pages: BTreeMap<String, ParsedPage>,
}

impl PaginationLinks {
    /// Parses a `paging` object. Anything other than an object yields no links.
    pub fn from_paging(paging: &Value, params: PageParams) -> Self {
        let pages = paging
            .as_object()
            .map(|object| {
                object
                    .iter()
                    .filter_map(|(id, link)| {
                        link.as_str()
                            .map(|link| (id.clone(), ParsedPage::parse(id.as_str(), link, params)))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { pages }
    }

    /// Returns the page for a relation.
    pub fn get(&self, id: &str) -> Option<&ParsedPage> {
        self.pages.get(id)
    }

    /// Link to the next page.
    pub fn next(&self) -> Option<&ParsedPage> {
        self.get("next")
    }

    /// Link to the previous page.
    pub fn previous(&self) -> Option<&ParsedPage> {
        self.get("previous")
    }

    /// Link to the first page.
    pub fn first(&self) -> Option<&ParsedPage> {
        self.get("first")
    }

    /// Link to the last page.
    pub fn last(&self) -> Option<&ParsedPage> {
        self.get("last")
    }

    /// Number of relations.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns true if the response had no paging links.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// A single page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    /// The items in this page.
    pub items: Vec<T>,
    /// Pagination links.
    pub pages: PaginationLinks,
    /// HTTP status of the list call.
    pub status: u16,
}

/// Fetches one page of a list endpoint and parses it.
#[derive(Debug, Clone)]
pub struct PageNavigator {
    request: Arc<RequestGateway>,
    params: PageParams,
}

impl PageNavigator {
    /// Creates a navigator for resources using the given cursor parameters.
    pub fn new(request: Arc<RequestGateway>, params: PageParams) -> Self {
        Self { request, params }
    }

    /// Issues `GET path?query`, maps `items` and parses `paging`.
    ///
    /// A missing `items` array yields an empty page. The first item that
    /// fails to parse fails the whole call.
    pub async fn request_list_with_pages<T, F>(
        &self,
        path: &str,
        query: &[(String, String)],
        parse_item: F,
    ) -> MailgunResult<ListPage<T>>
    where
        F: Fn(&Value) -> MailgunResult<T>,
    {
        let response = self.request.get(path, query).await?;

        let items = match response.body.get("items").and_then(Value::as_array) {
            Some(items) => items.iter().map(&parse_item).collect::<MailgunResult<_>>()?,
            None => Vec::new(),
        };

        let pages = response
            .body
            .get("paging")
            .map(|paging| PaginationLinks::from_paging(paging, self.params))
            .unwrap_or_default();

        Ok(ListPage {
            items,
            pages,
            status: response.status,
        })
    }
}
