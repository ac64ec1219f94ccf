//! SQLite source store for the watershed retrieval engine.
//!
//! This crate is the only place in the workspace that talks to SQLite. It
//! implements [`watershed_core::source::SourceStoreTrait`] over a directory
//! of read-only `.db3` files and contains:
//! - Folder scanning for source and lookup databases
//! - Schema, bounds and identifier-domain queries
//! - Parameterized, filtered projections of source tables
//!
//! ```text
//!        core (engine)
//!              │
//!              ▼
//!   storage-sqlite (this crate)
//!              │
//!              ▼
//!      *.db3 files (read-only)
//! ```

pub mod errors;
pub mod sources;
pub mod utils;

pub use errors::{IntoCore, StorageError};
pub use sources::SqliteSourceStore;

// Re-export from watershed-core for convenience
pub use watershed_core::errors::{DatabaseError, Error, Result};
