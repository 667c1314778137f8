//! Error types for encoding, building and persisting the similarity model.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    /// The artifact has not been built yet
    #[error("Model file not found at: {path}. Run `reel-recs train` first to build it")]
    ArtifactNotFound { path: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Vocabulary file error: {0}")]
    Json(#[from] serde_json::Error),

    /// The artifact exists but cannot be trusted (bad version, wrong size, ...)
    #[error("Corrupt model artifact: {0}")]
    Corrupt(String),

    /// Feature rows and row keys disagree on the number of items
    #[error("Feature matrix has {rows} rows but {keys} row keys were given")]
    DimensionMismatch { rows: usize, keys: usize },

    #[error("Duplicate row key for title '{0}'")]
    DuplicateRowKey(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
