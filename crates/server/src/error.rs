//! Error types for resolving queries and serving recommendations.

use data_loader::DataLoadError;
use similarity::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecommendError {
    /// The query was empty or only whitespace
    #[error("Movie title can't be empty")]
    InvalidQuery,

    /// Neither an exact nor a substring match exists
    #[error("Movie '{query}' not found in the database")]
    NotFound { query: String },

    /// The catalog or the similarity matrix has not been loaded
    #[error("Service not ready: catalog and similarity matrix are not loaded")]
    NotReady,

    /// The catalog has an item the similarity matrix knows nothing about
    #[error("'{title}' has no matching row in the similarity matrix; rebuild the model")]
    ArtifactMismatch { title: String },

    #[error(transparent)]
    Data(#[from] DataLoadError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl RecommendError {
    /// Errors caused by the request rather than the deployment
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidQuery | Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, RecommendError>;
