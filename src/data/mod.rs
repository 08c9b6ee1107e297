//! Core data models for storepick
//!
//! This module contains the store record type, the listing boundary used to
//! fetch records from the remote API, and the pure functions that order them.

pub mod dedupe;
pub mod openai;
pub mod retry;

pub use dedupe::dedupe_latest;
pub use openai::OpenAiLister;
pub use retry::RetryPolicy;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display format used for creation timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One remote vector store as seen at fetch time
///
/// Records are never mutated after construction; every transformation in
/// this crate produces a new list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRecord {
    /// Identifier assigned by the remote system, unique per store
    pub id: String,
    /// Human-chosen label, shared by re-created stores
    pub name: String,
    /// Creation time in seconds since the epoch, 0 when unknown
    pub created_at: i64,
    /// Number of files in the store
    pub file_count: u64,
    /// Storage footprint in bytes
    pub usage_bytes: u64,
}

impl StoreRecord {
    /// Creates a record with zeroed counters
    pub fn new(id: impl Into<String>, name: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created_at,
            file_count: 0,
            usage_bytes: 0,
        }
    }

    /// Creation time as a UTC datetime, the epoch when out of range
    pub fn created_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.created_at, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Creation time rendered in local time with [`TIMESTAMP_FORMAT`]
    pub fn created_at_formatted(&self) -> String {
        format_timestamp(self.created_at)
    }

    /// Storage footprint in mebibytes
    pub fn usage_mb(&self) -> f64 {
        self.usage_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Formats epoch seconds in local time
pub fn format_timestamp(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .with_timezone(&Local)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// A listing entry that could not be mapped to a [`StoreRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("skipped entry #{index} ({}): {reason}", .id.as_deref().unwrap_or("no id"))]
pub struct MalformedEntry {
    /// Position of the entry in the full listing
    pub index: usize,
    /// Identifier of the entry, if it had a usable one
    pub id: Option<String>,
    /// Why the entry was rejected
    pub reason: String,
}

/// Result of a successful listing call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Records in the order the remote API returned them
    pub records: Vec<StoreRecord>,
    /// Entries that were skipped because they could not be mapped
    pub skipped: Vec<MalformedEntry>,
}

/// Errors that abort a whole listing call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    /// The request could not be sent or the connection failed
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// The listing did not complete within the allowed time
    #[error("listing timed out after {0:?}")]
    Timeout(Duration),

    /// The remote API answered with a non-success status
    #[error("listing returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not a listing page
    #[error("failed to parse listing response: {0}")]
    Decode(String),
}

impl ListError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ListError::Transport(_) | ListError::Timeout(_) => true,
            ListError::Status { status, .. } => *status == 429 || *status >= 500,
            ListError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for ListError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ListError::Decode(err.to_string())
        } else {
            ListError::Transport(err.to_string())
        }
    }
}

/// The remote listing capability
///
/// Implementations perform I/O only; ordering and deduplication happen in
/// [`dedupe_latest`].
#[async_trait]
pub trait StoreLister: Send + Sync + 'static {
    /// Fetches every store visible to the caller
    async fn fetch_all(&self) -> Result<Listing, ListError>;
}
