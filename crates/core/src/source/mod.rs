//! Source databases: request-side identity of a source and the store seam.

mod source_model;
mod source_traits;
#[cfg(test)]
pub(crate) mod test_store;

pub use source_model::{
    AliasRow, DateFilter, EntryKind, FolderEntry, FolderListing, IdFilter, RowSet, SelectQuery,
    SourceColumn, SourceSpec,
};
pub use source_traits::SourceStoreTrait;
