//! Selection snapshots on disk
//!
//! Writes a selection plus run metadata to a single JSON file, replacing any
//! previous file atomically, and reads such files back for inspection.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::data::StoreRecord;

/// Format tag written into every snapshot
pub const SNAPSHOT_VERSION: &str = "1.0";

/// File name used when no output path is given
pub const DEFAULT_SNAPSHOT_FILE: &str = "latest_vector_stores.json";

/// Errors that can occur when writing or reading snapshots
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Filesystem operation failed
    #[error("snapshot I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Snapshot could not be serialized
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    /// File is not a snapshot
    #[error("failed to parse snapshot: {0}")]
    Decode(#[source] serde_json::Error),

    /// Snapshot was written by an unknown format version
    #[error("unsupported snapshot version '{0}'")]
    UnsupportedVersion(String),
}

impl PersistenceError {
    fn io(path: &Path, source: io::Error) -> Self {
        PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One store as written to a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    pub created_at_formatted: String,
    pub file_count: u64,
    pub usage_bytes: u64,
}

impl From<&StoreRecord> for SnapshotRecord {
    fn from(record: &StoreRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            created_at: record.created_at,
            created_at_formatted: record.created_at_formatted(),
            file_count: record.file_count,
            usage_bytes: record.usage_bytes,
        }
    }
}

impl From<SnapshotRecord> for StoreRecord {
    fn from(record: SnapshotRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            created_at: record.created_at,
            file_count: record.file_count,
            usage_bytes: record.usage_bytes,
        }
    }
}

/// Run metadata stored next to the records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Distinct-name stores available when the selection was made
    pub total_available: usize,
    /// Stores written to this snapshot
    pub selected_count: usize,
    /// When the snapshot was written
    pub updated_at: DateTime<Utc>,
    /// Program that wrote the snapshot
    pub source: String,
    /// Format tag, see [`SNAPSHOT_VERSION`]
    pub version: String,
}

/// The on-disk document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub latest_resources: Vec<SnapshotRecord>,
    pub selection_metadata: SnapshotMetadata,
}

/// A snapshot read back from disk for inspection
///
/// This is a point-in-time copy and is never used as a live cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedSnapshot {
    /// Where the snapshot was read from
    pub path: PathBuf,
    /// Stored records in their saved order
    pub records: Vec<StoreRecord>,
    /// Stored metadata
    pub metadata: SnapshotMetadata,
}

/// Default snapshot location in the platform data directory
///
/// Uses `~/.local/share/storepick/` on Linux, or the equivalent elsewhere.
/// Falls back to the current directory when no home directory is known.
pub fn default_snapshot_path() -> PathBuf {
    ProjectDirs::from("", "", "storepick")
        .map(|dirs| dirs.data_dir().join(DEFAULT_SNAPSHOT_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_FILE))
}

/// Writes selection snapshots
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    /// Value of `selection_metadata.source`
    source: String,
}

impl Default for SnapshotWriter {
    fn default() -> Self {
        Self::new("storepick")
    }
}

impl SnapshotWriter {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Builds the document for `records` without writing it
    pub fn build(&self, records: &[StoreRecord], total_available: usize) -> Snapshot {
        Snapshot {
            latest_resources: records.iter().map(SnapshotRecord::from).collect(),
            selection_metadata: SnapshotMetadata {
                total_available,
                selected_count: records.len(),
                updated_at: Utc::now(),
                source: self.source.clone(),
                version: SNAPSHOT_VERSION.to_string(),
            },
        }
    }

    /// Writes `records` and metadata to `path`, replacing any existing file
    ///
    /// The document goes to a uniquely named hidden sibling file first and is
    /// renamed over `path` only after it is fully flushed, so an interrupted
    /// write never leaves a truncated snapshot behind and concurrent exports
    /// to one path never share a temp file. Missing parent directories are
    /// created.
    pub fn export(
        &self,
        records: &[StoreRecord],
        total_available: usize,
        path: &Path,
    ) -> Result<(), PersistenceError> {
        let snapshot = self.build(records, total_available);
        let json = serde_json::to_string_pretty(&snapshot).map_err(PersistenceError::Encode)?;

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| PersistenceError::io(&parent, e))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".storepick-")
            .suffix(".tmp")
            .tempfile_in(&parent)
            .map_err(|e| PersistenceError::io(&parent, e))?;
        tmp.write_all(json.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| PersistenceError::io(tmp.path(), e))?;
        // A failed persist hands the temp file back and dropping it removes it.
        tmp.persist(path)
            .map_err(|e| PersistenceError::io(path, e.error))?;

        info!(path = %path.display(), selected = records.len(), total_available, "saved vector store snapshot");
        Ok(())
    }
}

/// Reads a snapshot written by [`SnapshotWriter::export`]
///
/// Snapshots with a version other than [`SNAPSHOT_VERSION`] are rejected
/// rather than interpreted.
pub fn load_snapshot(path: &Path) -> Result<ImportedSnapshot, PersistenceError> {
    let content = fs::read_to_string(path).map_err(|e| PersistenceError::io(path, e))?;
    let value: Value = serde_json::from_str(&content).map_err(PersistenceError::Decode)?;

    let version = value
        .pointer("/selection_metadata/version")
        .and_then(Value::as_str)
        .unwrap_or("");
    if version != SNAPSHOT_VERSION {
        return Err(PersistenceError::UnsupportedVersion(version.to_string()));
    }

    let snapshot: Snapshot = serde_json::from_value(value).map_err(PersistenceError::Decode)?;
    Ok(ImportedSnapshot {
        path: path.to_path_buf(),
        records: snapshot
            .latest_resources
            .into_iter()
            .map(StoreRecord::from)
            .collect(),
        metadata: snapshot.selection_metadata,
    })
}
