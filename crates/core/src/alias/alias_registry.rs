use std::path::Path;
use std::sync::{Arc, RwLock};

use super::alias_model::AliasMap;
use crate::errors::{Error, Result};
use crate::source::SourceStoreTrait;

/// Outcome of a registry load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasLoadReport {
    pub loaded_tables: Vec<String>,
    pub skipped_tables: Vec<String>,
}

/// Process-wide alias registry.
///
/// The map is built off to the side and swapped in whole, so readers always
/// see either the previous map or the complete new one.
#[derive(Debug, Default)]
pub struct AliasRegistry {
    map: RwLock<Option<Arc<AliasMap>>>,
}

impl AliasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with a map, mostly useful for tests and tools.
    pub fn with_map(map: AliasMap) -> Self {
        Self {
            map: RwLock::new(Some(Arc::new(map))),
        }
    }

    pub fn is_loaded(&self) -> Result<bool> {
        let guard = self.map.read().map_err(|e| Error::Cache(e.to_string()))?;
        Ok(guard.is_some())
    }

    /// Current map. An unloaded registry resolves every name to itself.
    pub fn snapshot(&self) -> Result<Arc<AliasMap>> {
        let guard = self.map.read().map_err(|e| Error::Cache(e.to_string()))?;
        Ok(guard.clone().unwrap_or_default())
    }

    /// Loads aliases from `lookup_database`, reading one lookup table per
    /// source database, named after the database's file stem.
    ///
    /// A lookup table that cannot be read is skipped; names of that source
    /// then pass through unchanged.
    pub fn load<S: AsRef<str>>(
        &self,
        store: &dyn SourceStoreTrait,
        lookup_database: &str,
        source_databases: &[S],
    ) -> Result<AliasLoadReport> {
        let mut map = AliasMap::default();
        let mut report = AliasLoadReport::default();

        for database in source_databases {
            let Some(lookup_table) = lookup_table_for(database.as_ref()) else {
                continue;
            };
            match store.alias_rows(lookup_database, &lookup_table) {
                Ok(rows) => {
                    for row in rows {
                        map.insert(row);
                    }
                    report.loaded_tables.push(lookup_table);
                }
                Err(e) => {
                    log::warn!(
                        "Skipping alias table '{}' in {}: {}",
                        lookup_table,
                        lookup_database,
                        e
                    );
                    report.skipped_tables.push(lookup_table);
                }
            }
        }

        log::info!(
            "Alias registry loaded {} tables from {} ({} lookup tables skipped)",
            map.table_count(),
            lookup_database,
            report.skipped_tables.len()
        );

        let mut guard = self.map.write().map_err(|e| Error::Cache(e.to_string()))?;
        *guard = Some(Arc::new(map));
        Ok(report)
    }

    /// Forgets the loaded map; the next discovery repopulates it.
    pub fn clear(&self) -> Result<()> {
        let mut guard = self.map.write().map_err(|e| Error::Cache(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

fn lookup_table_for(database: &str) -> Option<String> {
    Path::new(database)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DatabaseError;
    use crate::source::{AliasRow, FolderListing, RowSet, SelectQuery, SourceColumn};
    use crate::table::Value;

    const BULK_TABLES: usize = 250;

    struct LookupStore;

    impl SourceStoreTrait for LookupStore {
        fn scan_folder(&self, _folder: &str) -> Result<FolderListing> {
            unimplemented!()
        }
        fn list_tables(&self, _database: &str) -> Result<Vec<String>> {
            unimplemented!()
        }
        fn table_columns(&self, _database: &str, _table: &str) -> Result<Vec<SourceColumn>> {
            unimplemented!()
        }
        fn column_bounds(&self, _: &str, _: &str, _: &str) -> Result<(Value, Value)> {
            unimplemented!()
        }
        fn distinct_values(&self, _: &str, _: &str, _: &str) -> Result<Vec<Value>> {
            unimplemented!()
        }
        fn select(&self, _database: &str, _query: &SelectQuery) -> Result<RowSet> {
            unimplemented!()
        }
        fn alias_rows(&self, _lookup: &str, lookup_table: &str) -> Result<Vec<AliasRow>> {
            match lookup_table {
                "Hydroclimate" => Ok(vec![AliasRow {
                    table_name: "PCP_Results".to_string(),
                    table_alias: Some("Precip".to_string()),
                    column_name: "PCP".to_string(),
                    column_alias: Some("Precipitation".to_string()),
                }]),
                "Subbasin" => Ok((0..BULK_TABLES)
                    .map(|i| AliasRow {
                        table_name: format!("SUB_{}", i),
                        table_alias: Some(format!("Subbasin {}", i)),
                        column_name: "FLOW".to_string(),
                        column_alias: Some("Flow".to_string()),
                    })
                    .collect()),
                other => Err(DatabaseError::NotFound(other.to_string()).into()),
            }
        }
    }

    #[test]
    fn test_unloaded_registry_is_identity() {
        let registry = AliasRegistry::new();
        assert!(!registry.is_loaded().unwrap());
        let map = registry.snapshot().unwrap();
        assert_eq!(map.real_table("Precip"), "Precip");
    }

    #[test]
    fn test_load_skips_unreadable_lookup_tables() {
        let registry = AliasRegistry::new();
        let report = registry
            .load(
                &LookupStore,
                "Data/lookup.db3",
                &["Data/Hydroclimate.db3", "Data/Model01/BMP.db3"],
            )
            .unwrap();

        assert_eq!(report.loaded_tables, vec!["Hydroclimate".to_string()]);
        assert_eq!(report.skipped_tables, vec!["BMP".to_string()]);
        assert!(registry.is_loaded().unwrap());

        let map = registry.snapshot().unwrap();
        assert_eq!(map.real_table("Precip"), "PCP_Results");
        assert_eq!(map.alias_column("PCP_Results", "PCP"), "Precipitation");
    }

    #[test]
    fn test_snapshot_survives_clear() {
        let registry = AliasRegistry::new();
        registry
            .load(&LookupStore, "lookup.db3", &["Hydroclimate.db3"])
            .unwrap();
        let held = registry.snapshot().unwrap();

        registry.clear().unwrap();

        assert!(!registry.is_loaded().unwrap());
        assert_eq!(held.real_table("Precip"), "PCP_Results");
        assert_eq!(registry.snapshot().unwrap().real_table("Precip"), "Precip");
    }

    #[test]
    fn test_readers_never_see_a_partial_map() {
        let registry = AliasRegistry::new();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..50 {
                    registry
                        .load(&LookupStore, "lookup.db3", &["Subbasin.db3"])
                        .unwrap();
                    registry.clear().unwrap();
                }
                registry
                    .load(&LookupStore, "lookup.db3", &["Subbasin.db3"])
                    .unwrap();
            });
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..500 {
                        let map = registry.snapshot().unwrap();
                        let count = map.table_count();
                        assert!(count == 0 || count == BULK_TABLES, "saw {} tables", count);
                        if count == BULK_TABLES {
                            assert_eq!(map.real_table("Subbasin 249"), "SUB_249");
                        }
                    }
                });
            }
        });

        assert_eq!(registry.snapshot().unwrap().table_count(), BULK_TABLES);
    }
}
