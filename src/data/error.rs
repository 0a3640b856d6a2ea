//! Data layer error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or refreshing input data
#[derive(Error, Debug)]
pub enum DataError {
    /// I/O operation failed
    #[error("IO error on {path:?}: {error}")]
    Io { path: PathBuf, error: std::io::Error },

    /// CSV reader failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from a header row
    #[error("Missing column '{column}' in {source_name}")]
    MissingColumn { source_name: String, column: String },

    /// A cell could not be parsed
    #[error("Parse error in {source_name} line {line}: {message}")]
    Parse {
        source_name: String,
        line: usize,
        message: String,
    },

    /// Input parsed but contains no usable rows
    #[error("No data in {0}")]
    Empty(String),

    /// Boundary document is not a GeoJSON FeatureCollection
    #[error("Invalid geography: {0}")]
    Geography(String),

    /// JSON decoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Remote download failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl DataError {
    pub(crate) fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        DataError::Io {
            path: path.into(),
            error,
        }
    }
}

/// Result type alias for data operations
pub type DataResult<T> = Result<T, DataError>;
