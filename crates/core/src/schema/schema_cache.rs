use dashmap::DashMap;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use super::schema_model::SchemaEntry;
use crate::source::SourceSpec;

/// Process-wide cache of discovered table schemas, keyed by source.
///
/// Entries are handed out as `Arc`s: evicting or replacing an entry never
/// invalidates a copy a running fetch is still holding.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: DashMap<SourceSpec, Arc<SchemaEntry>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, source: &SourceSpec) -> Option<Arc<SchemaEntry>> {
        self.entries.get(source).map(|e| Arc::clone(e.value()))
    }

    pub fn insert(&self, entry: SchemaEntry) -> Arc<SchemaEntry> {
        let entry = Arc::new(entry);
        self.entries
            .insert(entry.source.clone(), Arc::clone(&entry));
        entry
    }

    /// Drops every entry whose source is not in `active`. Returns the number
    /// of evicted entries.
    pub fn retain_sources(&self, active: &[SourceSpec]) -> usize {
        let active: HashSet<&SourceSpec> = active.iter().collect();
        let before = self.entries.len();
        self.entries.retain(|source, _| {
            let keep = active.contains(source);
            if !keep {
                log::debug!("Evicting stale schema entry for {}", source);
            }
            keep
        });
        before.saturating_sub(self.entries.len())
    }

    /// Known (alias) columns per cached source.
    pub fn known_columns(&self) -> BTreeMap<String, Vec<String>> {
        self.entries
            .iter()
            .map(|e| {
                let columns: Vec<String> =
                    e.value().alias_columns().into_iter().map(String::from).collect();
                (e.key().to_string(), columns)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
