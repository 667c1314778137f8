//! Offline similarity model for tag-based movie recommendations.
//!
//! This crate provides:
//! - TagEncoder for turning catalog tags into sparse count vectors
//! - SimilarityMatrix for dense pairwise cosine similarity
//! - ModelStore for persisting and loading the built model
//!
//! ## Architecture
//! The model is built in stages:
//! 1. The encoder fits a vocabulary over every tag in the catalog
//! 2. Each item becomes a count vector over that vocabulary
//! 3. Cosine similarity is computed between every pair of items
//! 4. The matrix and vocabulary are written to the model directory
//!
//! ## Example Usage
//! ```ignore
//! use similarity::{ModelStore, RowIndex, SimilarityMatrix, TagEncoder, VocabularyState};
//!
//! let encoder = TagEncoder::new();
//! let (features, vocabulary) = encoder.fit_transform(&catalog);
//! let matrix = SimilarityMatrix::build(&features, RowIndex::from_catalog(&catalog))?;
//!
//! ModelStore::new("models").save(&matrix, &VocabularyState { encoder, vocabulary })?;
//! ```

pub mod error;
pub mod features;
pub mod matrix;
pub mod artifact;

// Re-export main types
pub use error::{ModelError, Result};
pub use features::{FeatureMatrix, FeatureRow, TagEncoder, Vocabulary, VocabularyState};
pub use matrix::{RowIndex, RowKey, SimilarityMatrix};
pub use artifact::{ArtifactPaths, ModelStore, MATRIX_FILE, VOCABULARY_FILE};

use data_loader::Catalog;

/// A freshly built model, ready to be saved or served
#[derive(Debug, Clone)]
pub struct BuiltModel {
    pub matrix: SimilarityMatrix,
    pub vocabulary: VocabularyState,
}

/// Run the whole offline build for a catalog
pub fn build_model(catalog: &Catalog, encoder: TagEncoder) -> Result<BuiltModel> {
    let (features, vocabulary) = encoder.fit_transform(catalog);
    let matrix = SimilarityMatrix::build(&features, RowIndex::from_catalog(catalog))?;
    Ok(BuiltModel {
        matrix,
        vocabulary: VocabularyState { encoder, vocabulary },
    })
}
