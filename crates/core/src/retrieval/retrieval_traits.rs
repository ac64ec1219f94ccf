use super::retrieval_model::{DataRequest, DataResponse};
use crate::errors::Result;
use crate::schema::{MultiTableDetails, TableDetails};
use crate::source::{FolderListing, SourceSpec};

/// Trait defining the contract for the data retrieval service.
pub trait DataServiceTrait: Send + Sync {
    /// Walks `folder` for sources; loads the alias registry the first time a
    /// lookup database is seen.
    fn list_files(&self, folder: &str) -> Result<FolderListing>;

    fn list_tables(&self, database: &str) -> Result<Vec<String>>;

    fn get_table_details(&self, source: &SourceSpec) -> Result<TableDetails>;

    fn get_multi_table_details(&self, sources: &[SourceSpec]) -> Result<MultiTableDetails>;

    fn fetch_data(&self, request: &DataRequest) -> Result<DataResponse>;

    /// Empties the schema cache and unloads the alias registry.
    fn clear_caches(&self) -> Result<()>;
}
