//! Error taxonomy for helper operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for helper operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors surfaced by helper operations.
///
/// Read operations trap [`DbError::Statement`] internally and yield empty
/// results; write and schema operations propagate it.
#[derive(Debug, Error)]
pub enum DbError {
    /// Statement rejected or failed inside the store.
    #[error("statement failed: {source}")]
    Statement {
        #[from]
        source: rusqlite::Error,
    },

    /// The database file could not be opened.
    #[error("cannot open database {path}: {source}")]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },

    /// The schema-import payload was not a JSON array of flat objects.
    #[error("invalid schema payload: {source}")]
    Payload {
        #[from]
        source: serde_json::Error,
    },

    /// Schema inference needs at least one sample element.
    #[error("empty sample array for table {table}")]
    EmptySample { table: String },
}
