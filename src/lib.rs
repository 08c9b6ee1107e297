//! storepick library
//!
//! Lists remote vector stores, keeps the newest store for each name, caches
//! the resolved list with a TTL and single-flight refresh, and exports the
//! selection as a snapshot file.

pub mod cache;
pub mod cli;
pub mod data;
pub mod mapping;
pub mod refresh;
pub mod selector;
pub mod snapshot;

#[cfg(test)]
mod test_support;

pub use cache::{CachedStores, StoreCache};
pub use data::{dedupe_latest, ListError, Listing, MalformedEntry, OpenAiLister, StoreLister, StoreRecord};
pub use mapping::{build_mapping, MappingError, SelectionMapping};
pub use selector::{Selection, SelectorConfig, StoreSelector};
pub use snapshot::{load_snapshot, ImportedSnapshot, PersistenceError, SnapshotWriter};
