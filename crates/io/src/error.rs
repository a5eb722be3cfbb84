use std::path::PathBuf;

use plantreg_conflate::ConflateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Csv {
        context: String,
        #[source]
        source: csv::Error,
    },

    #[error("{context}: invalid JSON: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{context}: row {row}: {message}")]
    MalformedRow {
        context: String,
        row: usize,
        message: String,
    },

    #[error("{context}: missing column '{column}'")]
    MissingColumn { context: String, column: String },

    #[error("{}: unsupported dataset format (expected .json or .csv)", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("{}: table 'powerplants' already exists", path.display())]
    TableExists { path: PathBuf },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Conflate(#[from] ConflateError),
}
