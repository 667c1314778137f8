//! Tag encoding.
//!
//! Turns each catalog item's tags into a sparse count vector over the
//! vocabulary of every distinct tag in the catalog. Counts are raw term
//! counts with no weighting.

use data_loader::{Catalog, DEFAULT_TAG_DELIMITER};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, instrument};

/// One sparse feature row: `(column, count)` pairs sorted by column
pub type FeatureRow = Vec<(usize, u32)>;

/// Tokenizer settings.
///
/// Persisted alongside the vocabulary so an encoding can be reproduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEncoder {
    /// Separator between tokens inside a tag string
    pub delimiter: char,
    /// Fold tokens to lowercase before counting
    pub lowercase: bool,
}

impl Default for TagEncoder {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_TAG_DELIMITER,
            lowercase: true,
        }
    }
}

impl TagEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the token delimiter (default: `|`)
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Configure case folding (default: on)
    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    /// Split an item's tags into tokens.
    ///
    /// Each tag is split again on the delimiter, so both `["Animation", "Comedy"]`
    /// and `["Animation|Comedy"]` give the same tokens.
    pub fn tokenize(&self, tags: &[String]) -> Vec<String> {
        tags.iter()
            .flat_map(|tag| tag.split(self.delimiter))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| {
                if self.lowercase {
                    token.to_lowercase()
                } else {
                    token.to_string()
                }
            })
            .collect()
    }

    /// Collect the vocabulary of a catalog
    pub fn fit(&self, catalog: &Catalog) -> Vocabulary {
        let tokens: BTreeSet<String> = catalog
            .iter()
            .flat_map(|item| self.tokenize(&item.tags))
            .collect();
        Vocabulary::from_tokens(tokens.into_iter().collect())
    }

    /// Encode every catalog item against a vocabulary.
    ///
    /// Tokens missing from the vocabulary are ignored.
    pub fn transform(&self, catalog: &Catalog, vocabulary: &Vocabulary) -> FeatureMatrix {
        let rows: Vec<FeatureRow> = catalog
            .items()
            .par_iter()
            .map(|item| {
                let mut counts: BTreeMap<usize, u32> = BTreeMap::new();
                for token in self.tokenize(&item.tags) {
                    if let Some(column) = vocabulary.column_of(&token) {
                        *counts.entry(column).or_insert(0) += 1;
                    }
                }
                counts.into_iter().collect()
            })
            .collect();

        FeatureMatrix::from_rows(rows, vocabulary.len())
    }

    /// Fit a vocabulary and encode the catalog with it
    #[instrument(skip(self, catalog), fields(items = catalog.len()))]
    pub fn fit_transform(&self, catalog: &Catalog) -> (FeatureMatrix, Vocabulary) {
        let vocabulary = self.fit(catalog);
        let features = self.transform(catalog, &vocabulary);
        debug!(
            "Encoded {} items over {} tag columns ({} non-zero entries)",
            features.n_rows(),
            features.n_cols(),
            features.nnz()
        );
        (features, vocabulary)
    }
}

/// Distinct tokens with a stable column assignment.
///
/// Tokens are kept sorted, so the same catalog always produces the same
/// column for the same token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    tokens: Vec<String>,
    columns: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build from tokens; duplicates are removed and the result is sorted
    pub fn from_tokens(mut tokens: Vec<String>) -> Self {
        tokens.sort();
        tokens.dedup();
        let columns = tokens
            .iter()
            .enumerate()
            .map(|(column, token)| (token.clone(), column))
            .collect();
        Self { tokens, columns }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn column_of(&self, token: &str) -> Option<usize> {
        self.columns.get(token).copied()
    }

    pub fn token(&self, column: usize) -> Option<&str> {
        self.tokens.get(column).map(String::as_str)
    }

    /// Tokens in column order
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

impl From<Vec<String>> for Vocabulary {
    fn from(tokens: Vec<String>) -> Self {
        Self::from_tokens(tokens)
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocabulary: Vocabulary) -> Self {
        vocabulary.tokens
    }
}

/// Everything needed to re-encode a catalog the same way.
///
/// Written to `vocabulary.json` next to the similarity matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyState {
    pub encoder: TagEncoder,
    pub vocabulary: Vocabulary,
}

/// Sparse `N x |vocabulary|` count matrix
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<FeatureRow>,
    n_cols: usize,
}

impl FeatureMatrix {
    /// Build from sparse rows. Each row must be sorted by column.
    pub fn from_rows(rows: Vec<FeatureRow>, n_cols: usize) -> Self {
        debug_assert!(rows.iter().all(|r| r.windows(2).all(|w| w[0].0 < w[1].0)));
        Self { rows, n_cols }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&FeatureRow> {
        self.rows.get(index)
    }

    /// Number of stored non-zero entries
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Euclidean norm of a row
    pub fn norm(&self, index: usize) -> f64 {
        self.rows[index]
            .iter()
            .map(|&(_, count)| (count as f64) * (count as f64))
            .sum::<f64>()
            .sqrt()
    }

    /// Dot product of two rows.
    ///
    /// Counts are integers, so the sum is exact and `dot(a, b) == dot(b, a)`.
    pub fn dot(&self, a: usize, b: usize) -> u64 {
        sparse_dot(&self.rows[a], &self.rows[b])
    }
}

/// Merge-join two column-sorted sparse rows
pub(crate) fn sparse_dot(a: &[(usize, u32)], b: &[(usize, u32)]) -> u64 {
    let (mut i, mut j) = (0, 0);
    let mut total = 0u64;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                total += a[i].1 as u64 * b[j].1 as u64;
                i += 1;
                j += 1;
            }
        }
    }
    total
}
