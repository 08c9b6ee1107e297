//! Display labels and name lookups for a selection
//!
//! Turns an ordered, deduplicated store list into the labels a picker shows
//! and a name → id map, so a chosen entry resolves without parsing labels.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::data::StoreRecord;

/// Errors raised for input that was not deduplicated upstream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// Two records in the input share a name
    #[error("duplicate store name in selection: '{0}'")]
    DuplicateName(String),
}

/// Picker labels plus the lookups behind them, in selection order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionMapping {
    /// `"{rank}. {name} ({created})"`, rank starting at 1
    pub labels: Vec<String>,
    /// Store name to store id
    pub name_to_id: HashMap<String, String>,
    /// Store names in rank order
    names: Vec<String>,
}

impl SelectionMapping {
    /// Number of entries
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the mapping has no entries
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Name and id of the entry with the given 1-based rank
    pub fn by_rank(&self, rank: usize) -> Option<(&str, &str)> {
        let name = self.names.get(rank.checked_sub(1)?)?;
        let id = self.name_to_id.get(name)?;
        Some((name.as_str(), id.as_str()))
    }

    /// Resolves a pick given as a 1-based rank or an exact store name
    pub fn resolve(&self, pick: &str) -> Option<(&str, &str)> {
        let pick = pick.trim();
        if let Some((name, id)) = self.name_to_id.get_key_value(pick) {
            return Some((name.as_str(), id.as_str()));
        }
        pick.parse::<usize>().ok().and_then(|rank| self.by_rank(rank))
    }
}

/// Formats the label for one entry
pub fn display_label(rank: usize, record: &StoreRecord) -> String {
    format!("{}. {} ({})", rank, record.name, record.created_at_formatted())
}

/// Builds labels and the name → id map for `records`, preserving order
///
/// # Returns
/// * `Ok(SelectionMapping)` for deduplicated input
/// * `Err(MappingError::DuplicateName)` if two records share a name
pub fn build_mapping(records: &[StoreRecord]) -> Result<SelectionMapping, MappingError> {
    let mut mapping = SelectionMapping {
        labels: Vec::with_capacity(records.len()),
        name_to_id: HashMap::with_capacity(records.len()),
        names: Vec::with_capacity(records.len()),
    };

    for (i, record) in records.iter().enumerate() {
        if mapping
            .name_to_id
            .insert(record.name.clone(), record.id.clone())
            .is_some()
        {
            return Err(MappingError::DuplicateName(record.name.clone()));
        }
        mapping.labels.push(display_label(i + 1, record));
        mapping.names.push(record.name.clone());
    }

    debug!(count = mapping.len(), "built selection mapping");
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<StoreRecord> {
        vec![
            StoreRecord::new("A2", "Docs", 200),
            StoreRecord::new("B1", "FAQ", 150),
        ]
    }

    #[test]
    fn test_labels_embed_rank_name_and_time() {
        let input = records();
        let mapping = build_mapping(&input).unwrap();

        assert_eq!(mapping.len(), 2);
        assert_eq!(
            mapping.labels[0],
            format!("1. Docs ({})", input[0].created_at_formatted())
        );
        assert!(mapping.labels[1].starts_with("2. FAQ ("));
        assert!(mapping.labels[1].ends_with(')'));
    }

    #[test]
    fn test_name_to_id() {
        let mapping = build_mapping(&records()).unwrap();

        assert_eq!(mapping.name_to_id.get("Docs").map(String::as_str), Some("A2"));
        assert_eq!(mapping.name_to_id.get("FAQ").map(String::as_str), Some("B1"));
    }

    #[test]
    fn test_empty_input() {
        let mapping = build_mapping(&[]).unwrap();
        assert!(mapping.is_empty());
        assert!(mapping.name_to_id.is_empty());
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let input = vec![
            StoreRecord::new("A1", "Docs", 100),
            StoreRecord::new("A2", "Docs", 200),
        ];

        let err = build_mapping(&input).unwrap_err();

        assert_eq!(err, MappingError::DuplicateName("Docs".to_string()));
    }

    #[test]
    fn test_resolve_by_rank_and_name() {
        let mapping = build_mapping(&records()).unwrap();

        assert_eq!(mapping.resolve("1"), Some(("Docs", "A2")));
        assert_eq!(mapping.resolve("FAQ"), Some(("FAQ", "B1")));
        assert_eq!(mapping.resolve(" 2 "), Some(("FAQ", "B1")));
        assert_eq!(mapping.resolve("0"), None);
        assert_eq!(mapping.resolve("3"), None);
        assert_eq!(mapping.resolve("Missing"), None);
    }

    #[test]
    fn test_numeric_store_name_wins_over_rank() {
        let input = vec![
            StoreRecord::new("vs_a", "Alpha", 300),
            StoreRecord::new("vs_2", "2", 100),
        ];
        let mapping = build_mapping(&input).unwrap();

        assert_eq!(mapping.resolve("2"), Some(("2", "vs_2")));
        assert_eq!(mapping.resolve("1"), Some(("Alpha", "vs_a")));
    }

    #[test]
    fn test_names_with_parentheses_need_no_parsing() {
        let input = vec![StoreRecord::new("vs_x", "Docs (v2) 2024-01-01", 10)];
        let mapping = build_mapping(&input).unwrap();

        assert_eq!(mapping.by_rank(1), Some(("Docs (v2) 2024-01-01", "vs_x")));
    }
}
