//! Latest-N vector store selection
//!
//! The selector is the public entry point: it asks the cache for the full
//! deduplicated list and cuts the newest `n` stores from it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::cache::{CachedStores, StoreCache, DEFAULT_FETCH_TIMEOUT, DEFAULT_TTL};
use crate::data::{ListError, StoreLister, StoreRecord};

/// Cache settings for a selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorConfig {
    /// How long a fetched list is served before refreshing
    pub ttl: Duration,
    /// Upper bound on one listing call
    pub fetch_timeout: Duration,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// The newest stores plus the freshness of the list they came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    /// Up to `n` stores, newest first, one per name
    pub records: Vec<StoreRecord>,
    /// Number of distinct-name stores in the cached list
    pub total_available: usize,
    /// When the underlying list was fetched, `None` for an empty request
    pub fetched_at: Option<DateTime<Utc>>,
    /// Whether the list is past its TTL or its refresh failed
    pub is_stale: bool,
    /// The masked refresh failure, if stale data is being served
    #[serde(serialize_with = "serialize_error")]
    pub refresh_error: Option<ListError>,
}

fn serialize_error<S: Serializer>(error: &Option<ListError>, serializer: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(error) => serializer.collect_str(error),
        None => serializer.serialize_none(),
    }
}

impl Selection {
    fn empty() -> Self {
        Self {
            records: Vec::new(),
            total_available: 0,
            fetched_at: None,
            is_stale: false,
            refresh_error: None,
        }
    }

    fn from_cached(cached: &CachedStores, n: usize) -> Self {
        Self {
            records: cached.top(n),
            total_available: cached.records.len(),
            fetched_at: Some(cached.fetched_at),
            is_stale: cached.is_stale,
            refresh_error: cached.refresh_error.clone(),
        }
    }

    /// Time since the underlying list was fetched
    pub fn age(&self) -> Option<chrono::Duration> {
        self.fetched_at.map(|fetched_at| Utc::now() - fetched_at)
    }
}

/// Selects the newest stores, one per name
pub struct StoreSelector {
    cache: StoreCache,
}

impl StoreSelector {
    /// Creates a selector with its own empty cache
    pub fn new(lister: Arc<dyn StoreLister>, config: SelectorConfig) -> Self {
        Self {
            cache: StoreCache::new(lister, config.ttl, config.fetch_timeout),
        }
    }

    /// Returns the newest `n` stores
    ///
    /// `n == 0` returns an empty selection without touching the cache. When
    /// fewer than `n` distinct names exist, all of them are returned.
    pub async fn get_latest_n(&self, n: usize, force_refresh: bool) -> Result<Selection, ListError> {
        if n == 0 {
            return Ok(Selection::empty());
        }

        let cached = self.cache.get(force_refresh).await?;
        let selection = Selection::from_cached(&cached, n);

        info!(
            requested = n,
            selected = selection.records.len(),
            total = selection.total_available,
            stale = selection.is_stale,
            "selected latest vector stores"
        );
        for (rank, record) in selection.records.iter().enumerate() {
            debug!(
                rank = rank + 1,
                name = %record.name,
                id = %record.id,
                created = %record.created_at_formatted(),
                files = record.file_count,
                bytes = record.usage_bytes,
                "selected store"
            );
        }

        Ok(selection)
    }

    /// The cached list without fetching, if any
    pub fn cached(&self) -> Option<CachedStores> {
        self.cache.peek()
    }

    /// Drops the cached list
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }
}
