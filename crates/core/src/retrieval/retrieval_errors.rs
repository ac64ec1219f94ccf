use thiserror::Error;

/// User-facing retrieval failures. Messages are shown to clients verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    /// The source was never described, or cannot be opened.
    #[error("No columns found for the table ({database}, {table})")]
    SchemaUnavailable { database: String, table: String },

    #[error("Error while processing table ({database}, {table}): {message}")]
    Fetch {
        database: String,
        table: String,
        message: String,
    },

    #[error("Table ({database}, {table}) shares no key column with the previous tables")]
    NoJoinKeys { database: String, table: String },

    #[error("No data found for the specified filters.")]
    EmptyResult,

    #[error("Tables have different {field}")]
    InconsistentSources { field: String },

    /// Resampling or statistics without a usable date column; carries the
    /// missing column name.
    #[error("Time conversion and statistics cannot be performed for non-time series data")]
    MissingTemporalContext(String),
}
