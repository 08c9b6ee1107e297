//! Recency ordering and per-name deduplication of store records

use std::cmp::Reverse;
use std::collections::HashMap;

use tracing::debug;

use super::StoreRecord;

/// Orders records newest first and keeps one record per name
///
/// The sort is stable, so records with equal `created_at` keep the relative
/// order the lister produced. When two records share a name the newer one
/// wins; on equal timestamps the first one encountered is kept. That
/// tie-break is deterministic for a deterministic listing but carries no
/// meaning about which physical store is canonical.
///
/// The output is a subset of the input, sorted descending by `created_at`,
/// and contains each name exactly once. Running it on its own output returns
/// the same list.
pub fn dedupe_latest(records: &[StoreRecord]) -> Vec<StoreRecord> {
    let mut sorted: Vec<&StoreRecord> = records.iter().collect();
    sorted.sort_by_key(|record| Reverse(record.created_at));

    let mut kept: Vec<&StoreRecord> = Vec::with_capacity(sorted.len());
    let mut slot_by_name: HashMap<&str, usize> = HashMap::new();

    for record in sorted {
        match slot_by_name.get(record.name.as_str()) {
            None => {
                slot_by_name.insert(record.name.as_str(), kept.len());
                kept.push(record);
            }
            Some(&slot) if record.created_at > kept[slot].created_at => {
                debug!(name = %record.name, id = %record.id, replaced = %kept[slot].id, "newer duplicate replaces earlier record");
                kept[slot] = record;
            }
            Some(&slot) => {
                debug!(name = %record.name, id = %record.id, kept = %kept[slot].id, "skipping older duplicate");
            }
        }
    }

    kept.into_iter().cloned().collect()
}
