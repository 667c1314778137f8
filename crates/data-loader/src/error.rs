//! Error types for the data-loader crate.
//!
//! Rust error handling concepts demonstrated:
//! - thiserror for defining custom error types
//! - Enum variants for different error cases
//! - `#[from]` conversions so `?` works on io and csv errors

use thiserror::Error;

/// Errors that can occur while reading and cleaning a catalog file
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found
    #[error("Data file not found at: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The CSV reader rejected the input (bad quoting, ragged rows, ...)
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// One or more required columns are absent from the header row
    #[error("Missing required columns: {missing:?}")]
    SchemaError { missing: Vec<String> },

    /// A record in the data file couldn't be parsed
    #[error("Parse error at line {line}: {reason}")]
    ParseError { line: u64, reason: String },

    /// The first record has no id, so forward-fill has nothing to copy
    #[error("First record (line {line}) has no id; an explicit initial id is required")]
    MissingInitialId { line: u64 },

    /// The file parsed but contained no records
    #[error("Catalog is empty")]
    EmptyCatalog,
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
