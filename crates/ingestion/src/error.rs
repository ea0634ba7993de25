//! Error types for the ingestion crate.

use thiserror::Error;

/// Upload-level failures: the table as a whole is unusable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Error reading CSV file: {0}")]
    Csv(String),

    #[error("Missing required columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("No valid data after removing missing GPS values")]
    EmptyData,

    #[error("No measurement columns found (third column onward)")]
    NoMeasurementColumns,
}

impl From<csv::Error> for TableError {
    fn from(err: csv::Error) -> Self {
        TableError::Csv(err.to_string())
    }
}

/// Per-column gate failures. These skip one column, never the upload.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GateError {
    #[error("No valid data for {column}")]
    NoValidData { column: String },

    #[error("{field} contains non-numeric values")]
    NonNumeric { field: String },

    #[error("Unknown measurement column: {0}")]
    UnknownColumn(String),
}

/// Result type for table operations.
pub type Result<T> = std::result::Result<T, TableError>;
