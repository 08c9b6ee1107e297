//! Single-flight in-memory cache for the resolved store list
//!
//! Provides a `StoreCache` that owns the last deduplicated listing and its
//! fetch time, refreshes through a [`StoreLister`] when the entry is missing,
//! stale or a refresh is forced, and shares one in-flight refresh between all
//! concurrent callers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::data::{dedupe_latest, ListError, StoreLister, StoreRecord};

/// How long an entry is served without refreshing
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Upper bound on a single listing call
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// One populated cache entry, replaced wholesale on refresh
#[derive(Debug)]
struct CacheEntry {
    /// Full deduplicated list, newest first
    records: Arc<[StoreRecord]>,
    /// Wall-clock fetch time
    fetched_at: DateTime<Utc>,
    /// Monotonic fetch time used for TTL checks
    fetched_instant: Instant,
}

impl CacheEntry {
    fn new(records: Vec<StoreRecord>) -> Self {
        Self {
            records: records.into(),
            fetched_at: Utc::now(),
            fetched_instant: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.fetched_instant.elapsed() >= ttl
    }
}

type SharedRefresh = Shared<BoxFuture<'static, Result<Arc<CacheEntry>, ListError>>>;

#[derive(Default)]
struct CacheState {
    entry: Option<Arc<CacheEntry>>,
    in_flight: Option<SharedRefresh>,
}

/// Result of reading from the cache, including metadata about freshness
#[derive(Debug, Clone)]
pub struct CachedStores {
    /// The full deduplicated list, newest first
    pub records: Arc<[StoreRecord]>,
    /// When the list was fetched from the remote API
    pub fetched_at: DateTime<Utc>,
    /// Whether the list is past its TTL or a refresh of it failed
    pub is_stale: bool,
    /// The refresh failure that was masked by serving this list, if any
    pub refresh_error: Option<ListError>,
}

impl CachedStores {
    fn from_entry(entry: &CacheEntry, is_stale: bool, refresh_error: Option<ListError>) -> Self {
        Self {
            records: Arc::clone(&entry.records),
            fetched_at: entry.fetched_at,
            is_stale,
            refresh_error,
        }
    }

    /// Time since the list was fetched
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.fetched_at
    }

    /// The first `n` records, or all of them when fewer exist
    pub fn top(&self, n: usize) -> Vec<StoreRecord> {
        self.records.iter().take(n).cloned().collect()
    }
}

/// Shared cache in front of a [`StoreLister`]
///
/// States: empty (no entry), fresh (entry younger than the TTL), stale
/// (entry at or past the TTL) and refreshing (a listing call in flight).
/// All state transitions happen under one mutex that is never held across
/// the remote call. The refresh itself runs on a spawned task that publishes
/// its result, so dropping a waiting caller never leaves the cache stuck.
pub struct StoreCache {
    lister: Arc<dyn StoreLister>,
    ttl: Duration,
    fetch_timeout: Duration,
    state: Arc<Mutex<CacheState>>,
}

impl StoreCache {
    /// Creates an empty cache
    pub fn new(lister: Arc<dyn StoreLister>, ttl: Duration, fetch_timeout: Duration) -> Self {
        Self {
            lister,
            ttl,
            fetch_timeout,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// The configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the full cached list, refreshing when needed
    ///
    /// A fresh entry is served without a listing call unless `force_refresh`
    /// is set. While a refresh is in flight, callers that did not force a
    /// refresh and have an entry to fall back on get it immediately; all
    /// others wait for the in-flight refresh instead of starting another.
    ///
    /// When a refresh fails and a previous entry exists, that entry is
    /// returned with `is_stale` set and the failure attached. Without a
    /// previous entry the failure is returned.
    pub async fn get(&self, force_refresh: bool) -> Result<CachedStores, ListError> {
        let refresh = {
            let mut state = lock(&self.state);

            if let Some(entry) = &state.entry {
                if !force_refresh && !entry.is_expired(self.ttl) {
                    debug!(count = entry.records.len(), "serving vector stores from cache");
                    return Ok(CachedStores::from_entry(entry, false, None));
                }
            }

            if state.in_flight.is_some() && !force_refresh {
                if let Some(entry) = &state.entry {
                    debug!("refresh in flight, serving previous entry");
                    return Ok(CachedStores::from_entry(entry, true, None));
                }
            }

            match state.in_flight.clone() {
                Some(in_flight) => in_flight,
                None => self.start_refresh(&mut state),
            }
        };

        match refresh.await {
            Ok(entry) => Ok(CachedStores::from_entry(&entry, false, None)),
            Err(err) => {
                let state = lock(&self.state);
                match &state.entry {
                    Some(previous) => {
                        warn!(error = %err, fetched_at = %previous.fetched_at, "refresh failed, serving previous vector store list");
                        Ok(CachedStores::from_entry(previous, true, Some(err)))
                    }
                    None => Err(err),
                }
            }
        }
    }

    /// Returns the current entry without fetching
    pub fn peek(&self) -> Option<CachedStores> {
        let state = lock(&self.state);
        state
            .entry
            .as_ref()
            .map(|entry| CachedStores::from_entry(entry, entry.is_expired(self.ttl), None))
    }

    /// Whether a refresh is currently in flight
    pub fn is_refreshing(&self) -> bool {
        lock(&self.state).in_flight.is_some()
    }

    /// Drops the cached entry so the next `get` refetches
    ///
    /// A refresh already in flight still publishes its result.
    pub fn invalidate(&self) {
        let mut state = lock(&self.state);
        if state.entry.take().is_some() {
            info!("vector store cache invalidated");
        }
    }

    /// Spawns the listing task and registers it as the in-flight refresh
    ///
    /// Must be called with the state lock held; the task waits for that lock
    /// before publishing, so it cannot clear `in_flight` before it is set.
    fn start_refresh(&self, state: &mut CacheState) -> SharedRefresh {
        let lister = Arc::clone(&self.lister);
        let shared_state = Arc::clone(&self.state);
        let timeout = self.fetch_timeout;

        debug!("starting vector store refresh");
        let task = tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, lister.fetch_all()).await {
                Ok(result) => result,
                Err(_) => Err(ListError::Timeout(timeout)),
            };
            let outcome = outcome.map(|listing| {
                let records = dedupe_latest(&listing.records);
                info!(
                    fetched = listing.records.len(),
                    distinct = records.len(),
                    skipped = listing.skipped.len(),
                    "vector store list refreshed"
                );
                Arc::new(CacheEntry::new(records))
            });

            let mut state = lock(&shared_state);
            state.in_flight = None;
            match &outcome {
                Ok(entry) => state.entry = Some(Arc::clone(entry)),
                Err(err) => warn!(error = %err, "vector store refresh failed"),
            }
            outcome
        });

        let refresh = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(join_err) => Err(ListError::Transport(format!(
                    "refresh task failed: {join_err}"
                ))),
            }
        }
        .boxed()
        .shared();

        state.in_flight = Some(refresh.clone());
        refresh
    }
}

fn lock(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
