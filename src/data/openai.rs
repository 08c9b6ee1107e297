//! Vector store listing client for OpenAI-compatible APIs
//!
//! Walks the paged `GET /vector_stores` endpoint and maps each raw entry
//! into a [`StoreRecord`]. Entries that cannot be mapped are skipped and
//! reported instead of failing the whole listing.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::{ListError, Listing, MalformedEntry, RetryPolicy, StoreLister, StoreRecord};

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Page size requested from the listing endpoint
const PAGE_LIMIT: u32 = 100;

/// Hard stop for runaway pagination
const MAX_PAGES: usize = 1000;

/// One page of the listing response
#[derive(Debug, Deserialize)]
struct ListPage {
    data: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    last_id: Option<String>,
}

/// Client for listing vector stores
#[derive(Debug, Clone)]
pub struct OpenAiLister {
    /// HTTP client for making requests
    http_client: Client,
    /// API root without a trailing slash
    base_url: String,
    /// Bearer token
    api_key: String,
    /// Retry settings applied per page
    retry: RetryPolicy,
}

impl OpenAiLister {
    /// Creates a lister against the default API root
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// Creates a lister against a custom API root (proxies, tests)
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetches one page, following the `after` cursor when given
    async fn fetch_page(&self, after: Option<&str>) -> Result<ListPage, ListError> {
        let url = format!("{}/vector_stores", self.base_url);
        let mut query = vec![("limit", PAGE_LIMIT.to_string())];
        if let Some(cursor) = after {
            query.push(("after", cursor.to_string()));
        }

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ListError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ListError::Decode(e.to_string()))
    }
}

#[async_trait]
impl StoreLister for OpenAiLister {
    async fn fetch_all(&self) -> Result<Listing, ListError> {
        info!(base_url = %self.base_url, "fetching vector store list");

        let mut raw: Vec<Value> = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let page = self
                .retry
                .run("vector_stores.list", || self.fetch_page(cursor.as_deref()))
                .await?;

            let page_len = page.data.len();
            raw.extend(page.data);

            if !page.has_more || page_len == 0 {
                break;
            }
            match page.last_id {
                Some(last_id) => cursor = Some(last_id),
                None => {
                    warn!("listing reported more pages without a cursor, stopping");
                    break;
                }
            }
        }

        let listing = map_entries(&raw);
        for skipped in &listing.skipped {
            warn!(index = skipped.index, id = ?skipped.id, reason = %skipped.reason, "skipping malformed vector store entry");
        }
        if listing.records.is_empty() {
            warn!("no vector stores found");
        } else {
            info!(count = listing.records.len(), skipped = listing.skipped.len(), "fetched vector stores");
        }

        Ok(listing)
    }
}

/// Maps raw listing entries, collecting the ones that do not fit
pub fn map_entries(entries: &[Value]) -> Listing {
    let mut listing = Listing::default();
    for (index, entry) in entries.iter().enumerate() {
        match map_entry(index, entry) {
            Ok(record) => listing.records.push(record),
            Err(skipped) => listing.skipped.push(skipped),
        }
    }
    listing
}

/// Maps a single raw entry
///
/// `id` and `name` are required. Missing or unusable `created_at`,
/// `file_counts.total` and `usage_bytes` fall back to 0.
fn map_entry(index: usize, entry: &Value) -> Result<StoreRecord, MalformedEntry> {
    let malformed = |id: Option<&str>, reason: &str| MalformedEntry {
        index,
        id: id.map(str::to_string),
        reason: reason.to_string(),
    };

    if !entry.is_object() {
        return Err(malformed(None, "entry is not an object"));
    }

    let id = entry
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| malformed(None, "missing id"))?;

    let name = entry
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| malformed(Some(id), "missing name"))?;

    let created_at = entry
        .get("created_at")
        .and_then(Value::as_i64)
        .unwrap_or(0)
        .max(0);

    let file_count = entry
        .get("file_counts")
        .and_then(|counts| counts.get("total"))
        .and_then(non_negative)
        .unwrap_or(0);

    let usage_bytes = entry.get("usage_bytes").and_then(non_negative).unwrap_or(0);

    Ok(StoreRecord {
        id: id.to_string(),
        name: name.to_string(),
        created_at,
        file_count,
        usage_bytes,
    })
}

/// Reads a count, clamping negative values to 0
fn non_negative(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_i64().map(|n| n.max(0) as u64))
}
