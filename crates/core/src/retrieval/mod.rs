//! Retrieval module - fetches, merges and post-processes multi-source data.

mod data_service;
mod retrieval_errors;
mod retrieval_model;
mod retrieval_traits;
mod source_merger;
mod table_fetcher;

pub use data_service::DataService;
pub use retrieval_errors::RetrievalError;
pub use retrieval_model::{ColumnRequest, DataRequest, DataResponse};
pub use retrieval_traits::DataServiceTrait;
pub use source_merger::{MergeRequest, SourceMerger};
pub use table_fetcher::{ColumnSelection, FetchFilters, RequestedColumn, TableFetcher};
