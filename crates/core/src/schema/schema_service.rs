use std::collections::HashSet;
use std::sync::Arc;

use super::schema_cache::SchemaCache;
use super::schema_model::{
    DateKind, MultiTableDetails, SchemaColumn, SchemaEntry, TableDetails,
};
use super::schema_policy::{date_columns_present, find_identifier_column, is_identifier_column};
use crate::alias::AliasRegistry;
use crate::constants::TABLE_COLUMN_SEPARATOR;
use crate::errors::{Result, ValidationError};
use crate::retrieval::RetrievalError;
use crate::source::{SourceSpec, SourceStoreTrait};
use crate::table::{ColumnType, Value};
use crate::utils::time_utils::{format_day, value_to_timestamp};

/// Schema discovery over the source databases, feeding the [`SchemaCache`].
pub struct SchemaService {
    store: Arc<dyn SourceStoreTrait>,
    registry: Arc<AliasRegistry>,
    cache: Arc<SchemaCache>,
}

impl SchemaService {
    pub fn new(
        store: Arc<dyn SourceStoreTrait>,
        registry: Arc<AliasRegistry>,
        cache: Arc<SchemaCache>,
    ) -> Self {
        Self {
            store,
            registry,
            cache,
        }
    }

    /// Alias names of every table in `database`.
    pub fn list_tables(&self, database: &str) -> Result<Vec<String>> {
        let aliases = self.registry.snapshot()?;
        let tables = self.store.list_tables(database)?;
        Ok(tables
            .iter()
            .map(|t| aliases.alias_table(t).to_string())
            .collect())
    }

    /// Inspects one source table without touching the cache.
    pub fn discover(&self, source: &SourceSpec) -> Result<SchemaEntry> {
        let aliases = self.registry.snapshot()?;
        let real_table = aliases.real_table(&source.table).to_string();
        let declared = self.store.table_columns(&source.database, &real_table)?;
        let real_names: Vec<&str> = declared.iter().map(|c| c.name.as_str()).collect();

        let present = date_columns_present(&real_names);
        if present.len() > 1 {
            log::warn!(
                "{} has several date columns {:?}; using '{}'",
                source,
                present,
                present[0]
            );
        }
        let date_kind = present.first().copied();
        let id_column = find_identifier_column(&real_names).map(String::from);

        // Key columns keep their real names so they line up across tables.
        let columns = declared
            .iter()
            .map(|c| {
                let is_key = is_identifier_column(&c.name)
                    || date_kind.is_some_and(|kind| kind.as_str() == c.name);
                let alias = if is_key {
                    c.name.clone()
                } else {
                    aliases.alias_column(&real_table, &c.name).to_string()
                };
                SchemaColumn {
                    real: c.name.clone(),
                    alias,
                    kind: ColumnType::from_declared(&c.declared_type),
                }
            })
            .collect();

        let (start, end) = match date_kind {
            Some(kind) => self.date_bounds(&source.database, &real_table, kind)?,
            None => (Value::Null, Value::Null),
        };

        let id_domain = match &id_column {
            Some(column) => {
                let mut ids: Vec<String> = self
                    .store
                    .distinct_values(&source.database, &real_table, column)?
                    .iter()
                    .filter_map(Value::key_repr)
                    .collect();
                sort_identifiers(&mut ids);
                ids
            }
            None => Vec::new(),
        };

        Ok(SchemaEntry {
            source: source.clone(),
            real_table,
            columns,
            date_kind,
            id_column,
            id_domain,
            start,
            end,
        })
    }

    /// Describes one source and records it in the cache.
    pub fn describe(&self, source: &SourceSpec) -> Result<TableDetails> {
        let entry = self.cache.insert(self.discover(source)?);
        Ok(TableDetails::from(entry.as_ref()))
    }

    /// Describes every source of a request, checks that they agree on date
    /// semantics and interval, and makes them the cache's active set.
    pub fn describe_many(&self, sources: &[SourceSpec]) -> Result<MultiTableDetails> {
        if sources.is_empty() {
            return Err(ValidationError::MissingField("db_tables".to_string()).into());
        }

        // Nothing reaches the cache until the whole selection is known to agree.
        let mut seen: HashSet<String> = HashSet::new();
        let mut discovered: Vec<(SchemaEntry, Vec<String>)> = Vec::with_capacity(sources.len());
        for source in sources {
            let entry = self.discover(source)?;
            let offered = offered_columns(&entry, &seen);
            seen.extend(entry.columns.iter().map(|c| c.alias.clone()));
            discovered.push((entry, offered));
        }

        let first = &discovered[0].0;
        if discovered.iter().any(|(e, _)| e.date_kind != first.date_kind) {
            return Err(RetrievalError::InconsistentSources {
                field: "date type".to_string(),
            }
            .into());
        }
        if discovered.iter().any(|(e, _)| e.granularity() != first.granularity()) {
            return Err(RetrievalError::InconsistentSources {
                field: "interval".to_string(),
            }
            .into());
        }

        let described: Vec<(Arc<SchemaEntry>, Vec<String>)> = discovered
            .into_iter()
            .map(|(entry, offered)| (self.cache.insert(entry), offered))
            .collect();
        let evicted = self.cache.retain_sources(sources);
        if evicted > 0 {
            log::debug!("Evicted {} stale schema entries", evicted);
        }

        let first = &described[0].0;
        let date_column = first.date_kind.map(|kind| kind.as_str().to_string());
        let id_column = described
            .iter()
            .find(|(e, _)| !e.id_domain.is_empty())
            .and_then(|(e, _)| e.id_column.clone());

        let mut columns: Vec<String> = Vec::new();
        columns.extend(date_column.clone());
        columns.extend(id_column.clone());
        for (_, offered) in &described {
            for name in offered {
                if Some(name) != date_column.as_ref() && !is_identifier_column(name) {
                    columns.push(name.clone());
                }
            }
        }

        let start_date = described
            .iter()
            .map(|(e, _)| &e.start)
            .max_by(|a, b| a.total_cmp(b))
            .cloned()
            .unwrap_or_default();
        let end_date = described
            .iter()
            .map(|(e, _)| &e.end)
            .filter(|v| !v.is_null())
            .min_by(|a, b| a.total_cmp(b))
            .cloned()
            .unwrap_or_default();

        Ok(MultiTableDetails {
            columns,
            global_columns: self.cache.known_columns(),
            start_date,
            end_date,
            ids: common_identifiers(&described),
            date_type: first.date_kind,
            interval: first.granularity(),
        })
    }

    fn date_bounds(&self, database: &str, table: &str, kind: DateKind) -> Result<(Value, Value)> {
        let (min, max) = self.store.column_bounds(database, table, kind.as_str())?;
        if kind.is_calendar_date() {
            Ok((calendar_bound(&min), calendar_bound(&max)))
        } else {
            Ok((integer_bound(&min), integer_bound(&max)))
        }
    }
}

/// Column names a source offers; a non-key column whose alias an earlier
/// source already offered gets a table prefix.
fn offered_columns(entry: &SchemaEntry, seen: &HashSet<String>) -> Vec<String> {
    entry
        .columns
        .iter()
        .map(|c| {
            let is_key = is_identifier_column(&c.real)
                || entry.date_kind.is_some_and(|kind| kind.as_str() == c.real);
            if seen.contains(&c.alias) && !is_key {
                format!("{}{}{}", entry.source.table, TABLE_COLUMN_SEPARATOR, c.alias)
            } else {
                c.alias.clone()
            }
        })
        .collect()
}

fn calendar_bound(value: &Value) -> Value {
    value_to_timestamp(value)
        .map(|ts| Value::Text(format_day(&ts)))
        .unwrap_or_default()
}

fn integer_bound(value: &Value) -> Value {
    match value {
        Value::Integer(i) => Value::Integer(*i),
        Value::Real(r) if r.is_finite() => Value::Integer(*r as i64),
        Value::Text(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_default(),
        _ => Value::Null,
    }
}

/// Identifiers shared by every source that has an identifier column.
fn common_identifiers(described: &[(Arc<SchemaEntry>, Vec<String>)]) -> Vec<String> {
    let mut domains = described
        .iter()
        .filter(|(e, _)| e.id_column.is_some())
        .map(|(e, _)| &e.id_domain);
    let Some(first) = domains.next() else {
        return Vec::new();
    };
    let mut common: Vec<String> = first.clone();
    for domain in domains {
        let domain: HashSet<&String> = domain.iter().collect();
        common.retain(|id| domain.contains(id));
    }
    sort_identifiers(&mut common);
    common
}

/// Numeric order when every identifier is an integer, text order otherwise.
fn sort_identifiers(ids: &mut Vec<String>) {
    let numeric: Option<Vec<i64>> = ids.iter().map(|id| id.parse::<i64>().ok()).collect();
    match numeric {
        Some(_) => ids.sort_by_key(|id| id.parse::<i64>().unwrap_or_default()),
        None => ids.sort(),
    }
    ids.dedup();
}
