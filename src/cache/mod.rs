//! Cache module for the resolved vector store list
//!
//! This module provides an in-memory cache that holds the deduplicated,
//! recency-sorted store list together with its fetch time. It serves fresh
//! entries without touching the remote API, refreshes at most once at a time
//! regardless of how many callers ask, and keeps the previous entry when a
//! refresh fails so callers can degrade to stale data.

mod manager;

pub use manager::{CachedStores, StoreCache, DEFAULT_FETCH_TIMEOUT, DEFAULT_TTL};
