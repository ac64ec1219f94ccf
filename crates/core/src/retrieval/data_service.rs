use std::sync::Arc;

use super::retrieval_errors::RetrievalError;
use super::retrieval_model::{DataRequest, DataResponse};
use super::retrieval_traits::DataServiceTrait;
use super::source_merger::{MergeRequest, SourceMerger};
use super::table_fetcher::{FetchFilters, TableFetcher};
use crate::alias::AliasRegistry;
use crate::analytics::{resample, summarize, Interval};
use crate::errors::{Result, ValidationError};
use crate::schema::{MultiTableDetails, SchemaCache, SchemaService, TableDetails};
use crate::source::{FolderListing, SourceSpec, SourceStoreTrait};

/// Service answering discovery and data requests over a source store.
pub struct DataService {
    store: Arc<dyn SourceStoreTrait>,
    registry: Arc<AliasRegistry>,
    cache: Arc<SchemaCache>,
    schema: SchemaService,
    merger: SourceMerger,
}

impl DataService {
    pub fn new(store: Arc<dyn SourceStoreTrait>) -> Self {
        Self::with_state(
            store,
            Arc::new(AliasRegistry::new()),
            Arc::new(SchemaCache::new()),
        )
    }

    /// Builds the service around existing registry and cache instances.
    pub fn with_state(
        store: Arc<dyn SourceStoreTrait>,
        registry: Arc<AliasRegistry>,
        cache: Arc<SchemaCache>,
    ) -> Self {
        let schema = SchemaService::new(store.clone(), registry.clone(), cache.clone());
        let merger = SourceMerger::new(
            cache.clone(),
            TableFetcher::new(store.clone(), registry.clone()),
        );
        Self {
            store,
            registry,
            cache,
            schema,
            merger,
        }
    }
}

impl DataServiceTrait for DataService {
    fn list_files(&self, folder: &str) -> Result<FolderListing> {
        let listing = self.store.scan_folder(folder)?;
        if let Some(lookup) = &listing.lookup {
            if !self.registry.is_loaded()? {
                let report = self
                    .registry
                    .load(self.store.as_ref(), lookup, listing.databases.as_slice())?;
                log::debug!(
                    "Loaded alias tables {:?}, skipped {:?}",
                    report.loaded_tables,
                    report.skipped_tables
                );
            }
        }
        Ok(listing)
    }

    fn list_tables(&self, database: &str) -> Result<Vec<String>> {
        self.schema.list_tables(database)
    }

    fn get_table_details(&self, source: &SourceSpec) -> Result<TableDetails> {
        self.schema.describe(source)
    }

    fn get_multi_table_details(&self, sources: &[SourceSpec]) -> Result<MultiTableDetails> {
        self.schema.describe_many(sources)
    }

    fn fetch_data(&self, request: &DataRequest) -> Result<DataResponse> {
        if request.sources.is_empty() {
            return Err(ValidationError::MissingField("db_tables".to_string()).into());
        }
        let statistics = request.statistic_kinds()?;
        let date_column = request.date_column();

        let merged = self.merger.merge(&MergeRequest {
            sources: &request.sources,
            columns: &request.columns,
            filters: FetchFilters {
                ids: &request.ids,
                window: request.date_window(),
            },
            date_column,
        })?;

        let temporal = || {
            date_column.ok_or_else(|| RetrievalError::MissingTemporalContext("date_type".to_string()))
        };

        let data = if request.interval == Interval::Daily {
            merged
        } else {
            resample(merged, temporal()?, request.interval)?
        };
        let stats = if statistics.is_empty() {
            None
        } else {
            Some(summarize(&data, &statistics, temporal()?)?)
        };

        log::debug!(
            "Fetched {} rows from {} sources (interval {}, {} statistics)",
            data.len(),
            request.sources.len(),
            request.interval,
            statistics.len()
        );
        Ok(DataResponse { data, stats })
    }

    fn clear_caches(&self) -> Result<()> {
        self.cache.clear();
        self.registry.clear()?;
        log::info!("Schema cache and alias registry cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::StatisticKind;
    use crate::errors::Error;
    use crate::retrieval::ColumnRequest;
    use crate::source::test_store::{daily_rows, MemoryStore};
    use crate::source::AliasRow;
    use crate::table::Value;
    use chrono::NaiveDate;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, m, d).unwrap()
    }

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_table(
                "hydro.db3",
                "REACH",
                &[("Time", "TEXT"), ("ID", "INTEGER"), ("FLOW_OUT", "REAL")],
                daily_rows(date(1, 1), date(3, 31), &[1, 2], |d, id| {
                    f64::from(chrono::Datelike::month(&d)) * 10.0 + id as f64
                }),
            )
            .with_lookup(
                "hydro",
                vec![AliasRow {
                    table_name: "REACH".to_string(),
                    table_alias: Some("Flow".to_string()),
                    column_name: "FLOW_OUT".to_string(),
                    column_alias: Some("Discharge".to_string()),
                }],
            )
    }

    fn service() -> DataService {
        DataService::new(Arc::new(store()))
    }

    fn flow() -> Vec<SourceSpec> {
        vec![SourceSpec::new("hydro.db3", "Flow")]
    }

    #[test]
    fn test_list_files_loads_aliases_once() {
        let service = service();
        assert!(!service.registry.is_loaded().unwrap());

        let listing = service.list_files("Watershed").unwrap();

        assert_eq!(listing.databases, vec!["hydro.db3"]);
        assert!(service.registry.is_loaded().unwrap());
        assert_eq!(service.list_tables("hydro.db3").unwrap(), vec!["Flow"]);
    }

    #[test]
    fn test_monthly_average_uses_first_of_month() {
        let service = service();
        service.list_files("Watershed").unwrap();
        service.get_multi_table_details(&flow()).unwrap();

        let response = service
            .fetch_data(&DataRequest {
                sources: flow(),
                columns: ColumnRequest::Named(vec!["Discharge".to_string()]),
                date_type: Some("Time".to_string()),
                interval: Interval::Monthly,
                statistics: vec!["Average".to_string()],
                ..Default::default()
            })
            .unwrap();

        // One row per (month, ID), grouped by ID.
        assert_eq!(response.data.len(), 6);
        assert_eq!(
            response.data.rows()[0],
            vec![Value::from("2020-01"), Value::Integer(1), Value::Real(11.0)]
        );
        assert_eq!(
            response.data.rows()[3],
            vec![Value::from("2020-01"), Value::Integer(2), Value::Real(12.0)]
        );

        let stats = response.stats.unwrap();
        assert_eq!(stats.column_names(), vec!["Statistics", "ID", "Discharge"]);
        assert_eq!(
            stats.rows()[0],
            vec![Value::from("Average"), Value::Real(1.5), Value::Real(21.5)]
        );
    }

    #[test]
    fn test_statistics_require_date_type() {
        let service = service();
        service.get_table_details(&flow()[0]).unwrap();

        let err = service
            .fetch_data(&DataRequest {
                sources: flow(),
                statistics: vec![StatisticKind::Sum.to_string()],
                ..Default::default()
            })
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Retrieval(RetrievalError::MissingTemporalContext(_))
        ));
    }

    #[test]
    fn test_placeholder_statistics_mean_none() {
        let service = service();
        service.get_table_details(&flow()[0]).unwrap();

        let response = service
            .fetch_data(&DataRequest {
                sources: flow(),
                statistics: vec!["None".to_string()],
                ..Default::default()
            })
            .unwrap();

        assert!(response.stats.is_none());
        assert_eq!(response.data.len(), 182);
    }

    #[test]
    fn test_clear_caches_forgets_schema_and_aliases() {
        let service = service();
        service.list_files("Watershed").unwrap();
        service.get_multi_table_details(&flow()).unwrap();

        service.clear_caches().unwrap();

        assert!(service.cache.is_empty());
        assert!(!service.registry.is_loaded().unwrap());
        let err = service
            .fetch_data(&DataRequest {
                sources: flow(),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "No columns found for the table (hydro.db3, Flow)");
    }

    #[test]
    fn test_empty_request_is_rejected() {
        let err = service().fetch_data(&DataRequest::default()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
