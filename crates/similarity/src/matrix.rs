//! Dense cosine similarity matrix.
//!
//! ## Algorithm
//! `S[i][j] = dot(v_i, v_j) / (|v_i| * |v_j|)`
//!
//! - Rows are computed in parallel with Rayon, one task per row
//! - Arithmetic is done in `f64` and stored as `f32`
//! - A row with zero norm is all zeros, its own diagonal included
//! - Any other row has `S[i][i] == 1.0`

use crate::error::{ModelError, Result};
use crate::features::FeatureMatrix;
use data_loader::{Catalog, ItemId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument};

/// Identity of the item stored in one matrix row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowKey {
    pub id: ItemId,
    pub title: String,
}

/// Maps matrix rows to catalog items and back.
///
/// Titles are unique in a cleaned catalog, so the title is the lookup key.
/// Ids are carried along so a mismatch between a catalog and an artifact
/// built from a different file can be detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIndex {
    keys: Vec<RowKey>,
    by_title: HashMap<String, usize>,
}

impl RowIndex {
    /// Row keys in catalog order
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let keys: Vec<RowKey> = catalog
            .iter()
            .map(|item| RowKey {
                id: item.id,
                title: item.title.clone(),
            })
            .collect();
        // Catalog titles are already unique, no need to check
        let by_title = keys
            .iter()
            .enumerate()
            .map(|(row, key)| (key.title.clone(), row))
            .collect();
        Self { keys, by_title }
    }

    /// Build from explicit keys, rejecting duplicate titles
    pub fn from_keys(keys: Vec<RowKey>) -> Result<Self> {
        let mut by_title = HashMap::with_capacity(keys.len());
        for (row, key) in keys.iter().enumerate() {
            if by_title.insert(key.title.clone(), row).is_some() {
                return Err(ModelError::DuplicateRowKey(key.title.clone()));
            }
        }
        Ok(Self { keys, by_title })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn key(&self, row: usize) -> Option<&RowKey> {
        self.keys.get(row)
    }

    pub fn keys(&self) -> &[RowKey] {
        &self.keys
    }

    pub fn row_of_title(&self, title: &str) -> Option<usize> {
        self.by_title.get(title).copied()
    }
}

/// Symmetric `N x N` matrix of cosine similarities, stored row-major.
///
/// Immutable once built: there is no way to change a score in place.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    n: usize,
    data: Vec<f32>,
    rows: RowIndex,
}

impl SimilarityMatrix {
    /// Compute all pairwise cosine similarities.
    ///
    /// ## Performance Note
    /// O(N² · avg tags per item) time and `4 · N²` bytes of memory. Fine for
    /// catalogs in the low tens of thousands of items.
    #[instrument(skip_all, fields(items = features.n_rows()))]
    pub fn build(features: &FeatureMatrix, rows: RowIndex) -> Result<Self> {
        let n = features.n_rows();
        if rows.len() != n {
            return Err(ModelError::DimensionMismatch {
                rows: n,
                keys: rows.len(),
            });
        }

        let norms: Vec<f64> = (0..n).into_par_iter().map(|i| features.norm(i)).collect();

        let mut data = vec![0.0f32; n * n];
        if n > 0 {
            data.par_chunks_mut(n).enumerate().for_each(|(i, out)| {
                if norms[i] == 0.0 {
                    return; // similar to nothing, itself included
                }
                for (j, cell) in out.iter_mut().enumerate() {
                    *cell = if i == j {
                        1.0
                    } else if norms[j] == 0.0 {
                        0.0
                    } else {
                        let cosine = features.dot(i, j) as f64 / (norms[i] * norms[j]);
                        cosine.clamp(0.0, 1.0) as f32
                    };
                }
            });
        }

        let zero_rows = norms.iter().filter(|&&norm| norm == 0.0).count();
        info!("Similarity matrix shape: ({}, {}), {} rows without tags", n, n, zero_rows);

        Ok(Self { n, data, rows })
    }

    /// Reassemble a matrix from persisted parts
    pub fn from_parts(rows: RowIndex, data: Vec<f32>) -> Result<Self> {
        let n = rows.len();
        if data.len() != n * n {
            return Err(ModelError::Corrupt(format!(
                "expected {} scores for {} rows, found {}",
                n * n,
                n,
                data.len()
            )));
        }
        Ok(Self { n, data, rows })
    }

    /// Number of rows (and columns)
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        if i < self.n && j < self.n {
            Some(self.data[i * self.n + j])
        } else {
            None
        }
    }

    /// Scores of row `i` against every row
    pub fn row(&self, i: usize) -> Option<&[f32]> {
        if i < self.n {
            Some(&self.data[i * self.n..(i + 1) * self.n])
        } else {
            None
        }
    }

    pub fn row_index(&self) -> &RowIndex {
        &self.rows
    }

    pub fn row_of_title(&self, title: &str) -> Option<usize> {
        self.rows.row_of_title(title)
    }

    /// Largest score in row `i`
    pub fn max_in_row(&self, i: usize) -> Option<f32> {
        self.row(i)?.iter().copied().reduce(f32::max)
    }

    /// Raw row-major scores
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}
