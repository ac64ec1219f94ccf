//! SQLite-backed source store.

mod model;
mod repository;
mod scan;

pub use repository::SqliteSourceStore;
pub use scan::scan_folder;
