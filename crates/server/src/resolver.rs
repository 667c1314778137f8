//! # Recommendation Resolver
//!
//! Turns a free-text title into its nearest neighbors:
//! 1. Trim the query and reject it if empty
//! 2. Case-insensitive exact title match (first in catalog order)
//! 3. Otherwise case-insensitive substring match (first in catalog order)
//! 4. Look up the matched item's row in the similarity matrix
//! 5. Rank every other item by score, ties broken by catalog position
//! 6. Return the top N, scores rounded to 4 decimals
//!
//! [`RecommendationService`] is built once at startup and never mutated, so
//! any number of lookups can run against it in parallel through an `Arc`.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{RecommendError, Result};
use data_loader::{Catalog, CatalogOptions, ItemId};
use similarity::{ModelStore, SimilarityMatrix};

/// A recommended item with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub item_id: ItemId,
    pub title: String,
    pub tags: Vec<String>,
    /// Cosine similarity rounded to 4 decimal places
    pub score: f32,
}

/// How a query was matched to a title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    Substring,
}

/// Result of resolving a query to a catalog item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub position: usize,
    pub title: String,
    pub strategy: MatchStrategy,
}

/// One candidate returned by [`RecommendationService::search`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub position: usize,
    pub item_id: ItemId,
    pub title: String,
    pub tags: Vec<String>,
    pub strategy: MatchStrategy,
}

/// Immutable serving context: the catalog, its similarity matrix, and the
/// mapping between catalog positions and matrix rows.
#[derive(Debug)]
pub struct RecommendationService {
    catalog: Arc<Catalog>,
    matrix: SimilarityMatrix,
    /// Matrix row of each catalog position
    rows: Vec<usize>,
    /// Lowercased titles, in catalog order
    folded_titles: Vec<String>,
}

impl RecommendationService {
    /// Align a catalog with a similarity matrix.
    ///
    /// Every catalog item must have a matrix row with the same title and id.
    /// Matrix rows without a catalog item are ignored.
    pub fn new(catalog: Arc<Catalog>, matrix: SimilarityMatrix) -> Result<Self> {
        let mut rows = Vec::with_capacity(catalog.len());
        for item in catalog.iter() {
            let row = matrix
                .row_of_title(&item.title)
                .filter(|&row| {
                    matrix
                        .row_index()
                        .key(row)
                        .is_some_and(|key| key.id == item.id)
                })
                .ok_or_else(|| RecommendError::ArtifactMismatch {
                    title: item.title.clone(),
                })?;
            rows.push(row);
        }

        if matrix.n() > catalog.len() {
            warn!(
                "Similarity matrix has {} rows but the catalog only {} items; extra rows are ignored",
                matrix.n(),
                catalog.len()
            );
        }

        let folded_titles = catalog.iter().map(|item| item.title.to_lowercase()).collect();

        Ok(Self {
            catalog,
            matrix,
            rows,
            folded_titles,
        })
    }

    /// Load the catalog file and the persisted matrix, then align them.
    ///
    /// Any failure here means the deployment is misconfigured; callers
    /// should treat it as fatal.
    pub fn load(data_path: &Path, options: &CatalogOptions, model_dir: &Path) -> Result<Self> {
        let start = Instant::now();
        let catalog = Catalog::load(data_path, options)?;
        let matrix = ModelStore::new(model_dir).load_matrix()?;
        let service = Self::new(Arc::new(catalog), matrix)?;
        info!(
            "Recommendation service ready with {} items in {:.2?}",
            service.len(),
            start.elapsed()
        );
        Ok(service)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }

    /// Number of catalog items
    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    /// Main entry point: top `top_n` items most similar to the title in `query`
    #[instrument(skip(self))]
    pub fn recommend(&self, query: &str, top_n: usize) -> Result<Vec<Recommendation>> {
        let resolved = self.resolve(query)?;
        let recommendations = self.neighbors(resolved.position, top_n);
        debug!(
            "Returning {} recommendations for '{}'",
            recommendations.len(),
            resolved.title
        );
        Ok(recommendations)
    }

    /// Resolve a free-text query to a single catalog item.
    ///
    /// An exact (case-insensitive) match always wins over a substring match,
    /// even one earlier in the catalog.
    pub fn resolve(&self, query: &str) -> Result<Resolved> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RecommendError::InvalidQuery);
        }
        let folded = query.to_lowercase();

        if let Some(position) = self.folded_titles.iter().position(|t| *t == folded) {
            return Ok(self.resolved(position, MatchStrategy::Exact));
        }

        if let Some(position) = self.folded_titles.iter().position(|t| t.contains(&folded)) {
            let resolved = self.resolved(position, MatchStrategy::Substring);
            info!("Using closest match: {}", resolved.title);
            return Ok(resolved);
        }

        Err(RecommendError::NotFound {
            query: query.to_string(),
        })
    }

    /// All titles matching a query: exact matches first, then substring
    /// matches, each group in catalog order.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RecommendError::InvalidQuery);
        }
        let folded = query.to_lowercase();

        let mut exact = Vec::new();
        let mut partial = Vec::new();
        for (position, title) in self.folded_titles.iter().enumerate() {
            if *title == folded {
                exact.push((position, MatchStrategy::Exact));
            } else if title.contains(&folded) {
                partial.push((position, MatchStrategy::Substring));
            }
        }

        Ok(exact
            .into_iter()
            .chain(partial)
            .take(limit)
            .filter_map(|(position, strategy)| {
                let item = self.catalog.get(position)?;
                Some(SearchHit {
                    position,
                    item_id: item.id,
                    title: item.title.clone(),
                    tags: item.tags.clone(),
                    strategy,
                })
            })
            .collect())
    }

    /// Rank every other catalog item against the item at `position`.
    ///
    /// Sorted by score descending; equal scores keep catalog order. The item
    /// itself is never part of the result.
    pub fn neighbors(&self, position: usize, top_n: usize) -> Vec<Recommendation> {
        let Some(scores) = self.rows.get(position).and_then(|&row| self.matrix.row(row)) else {
            return Vec::new();
        };

        let mut ranked: Vec<(usize, f32)> = self
            .rows
            .iter()
            .enumerate()
            .filter(|&(other, _)| other != position)
            .map(|(other, &row)| (other, scores[row]))
            .collect();

        // Stable sort: ties stay in ascending catalog position
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked.truncate(top_n);

        ranked
            .into_iter()
            .filter_map(|(other, score)| {
                let item = self.catalog.get(other)?;
                Some(Recommendation {
                    item_id: item.id,
                    title: item.title.clone(),
                    tags: item.tags.clone(),
                    score: round_score(score),
                })
            })
            .collect()
    }

    fn resolved(&self, position: usize, strategy: MatchStrategy) -> Resolved {
        Resolved {
            position,
            title: self
                .catalog
                .get(position)
                .map(|item| item.title.clone())
                .unwrap_or_default(),
            strategy,
        }
    }
}

/// Round to 4 decimal places
fn round_score(score: f32) -> f32 {
    ((score as f64 * 10_000.0).round() / 10_000.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::CatalogItem;
    use similarity::{build_model, RowIndex, RowKey, TagEncoder};

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    fn item(id: ItemId, title: &str, tags: &[&str]) -> CatalogItem {
        CatalogItem {
            id,
            title: title.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn build_service(items: Vec<CatalogItem>) -> RecommendationService {
        let catalog = Catalog::from_items(items).expect("Failed to build catalog");
        let model = build_model(&catalog, TagEncoder::new()).expect("Failed to build model");
        RecommendationService::new(Arc::new(catalog), model.matrix).expect("Failed to align model")
    }

    /// Toy Story / Cars / Saw
    fn build_test_service() -> RecommendationService {
        build_service(vec![
            item(1, "Toy Story (1995)", &["Animation", "Comedy"]),
            item(2, "Cars (2006)", &["Animation", "Comedy"]),
            item(3, "Saw (2004)", &["Horror"]),
        ])
    }

    fn titles(recommendations: &[Recommendation]) -> Vec<&str> {
        recommendations.iter().map(|r| r.title.as_str()).collect()
    }

    // ============================================================================
    // Unit Tests: resolve
    // ============================================================================

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let service = build_test_service();
        let resolved = service.resolve("  toy story (1995) ").unwrap();
        assert_eq!(resolved.position, 0);
        assert_eq!(resolved.strategy, MatchStrategy::Exact);
    }

    #[test]
    fn test_substring_fallback() {
        let service = build_test_service();
        let resolved = service.resolve("Toy Story").unwrap();
        assert_eq!(resolved.title, "Toy Story (1995)");
        assert_eq!(resolved.strategy, MatchStrategy::Substring);
    }

    #[test]
    fn test_exact_match_beats_earlier_substring_match() {
        let service = build_service(vec![
            item(1, "Alien Resurrection (1997)", &["Sci-Fi"]),
            item(2, "Alien", &["Horror"]),
        ]);
        let resolved = service.resolve("alien").unwrap();
        assert_eq!(resolved.position, 1);
        assert_eq!(resolved.strategy, MatchStrategy::Exact);
    }

    #[test]
    fn test_substring_is_literal_not_a_pattern() {
        let service = build_service(vec![
            item(1, "Se7en (1995)", &["Crime"]),
            item(2, "Who Framed Roger Rabbit? (1988)", &["Comedy"]),
        ]);
        assert_eq!(service.resolve("rabbit?").unwrap().position, 1);
        assert!(matches!(service.resolve("s.7en"), Err(RecommendError::NotFound { .. })));
    }

    #[test]
    fn test_empty_query_is_invalid() {
        let service = build_test_service();
        assert!(matches!(service.recommend("", 5), Err(RecommendError::InvalidQuery)));
        assert!(matches!(service.recommend("   ", 5), Err(RecommendError::InvalidQuery)));
    }

    #[test]
    fn test_unknown_title_names_the_query() {
        let service = build_test_service();
        match service.recommend("Nonexistent Film", 5) {
            Err(RecommendError::NotFound { query }) => assert_eq!(query, "Nonexistent Film"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    // ============================================================================
    // Unit Tests: recommend / neighbors
    // ============================================================================

    #[test]
    fn test_recommend_toy_story() {
        let service = build_test_service();
        let recommendations = service.recommend("toy story (1995)", 2).unwrap();

        assert_eq!(titles(&recommendations), vec!["Cars (2006)", "Saw (2004)"]);
        assert_eq!(recommendations[0].score, 1.0);
        assert_eq!(recommendations[1].score, 0.0);
        assert_eq!(recommendations[0].item_id, 2);
        assert_eq!(recommendations[0].tags, vec!["Animation", "Comedy"]);
    }

    #[test]
    fn test_never_returns_the_query_item_even_on_ties() {
        // Toy Story sits before Cars and scores 1.0 against it, same as Cars itself
        let service = build_test_service();
        let recommendations = service.recommend("Cars (2006)", 5).unwrap();
        assert_eq!(titles(&recommendations), vec!["Toy Story (1995)", "Saw (2004)"]);
    }

    #[test]
    fn test_ties_ordered_by_catalog_position() {
        let service = build_service(vec![
            item(1, "Query", &["Drama"]),
            item(2, "Zeta", &["Horror"]),
            item(3, "Beta", &["Drama"]),
            item(4, "Alpha", &["Horror"]),
            item(5, "Gamma", &["Drama"]),
        ]);
        let recommendations = service.recommend("Query", 10).unwrap();
        assert_eq!(titles(&recommendations), vec!["Beta", "Gamma", "Zeta", "Alpha"]);
    }

    #[test]
    fn test_scores_descending_and_rounded() {
        let service = build_service(vec![
            item(1, "A", &["Action", "Adventure", "Sci-Fi"]),
            item(2, "B", &["Action"]),
            item(3, "C", &["Action", "Adventure"]),
            item(4, "D", &["Drama"]),
        ]);
        let recommendations = service.recommend("A", 3).unwrap();

        let scores: Vec<f32> = recommendations.iter().map(|r| r.score).collect();
        // 2/sqrt(6), 1/sqrt(3), 0
        assert_eq!(scores, vec![0.8165, 0.5774, 0.0]);
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_top_n_bounds() {
        let service = build_test_service();
        assert!(service.recommend("Saw", 0).unwrap().is_empty());
        assert_eq!(service.recommend("Saw", 100).unwrap().len(), 2);
    }

    #[test]
    fn test_single_item_catalog_has_no_neighbors() {
        let service = build_service(vec![item(1, "Lonely (2000)", &["Drama"])]);
        assert!(service.recommend("Lonely", 5).unwrap().is_empty());
    }

    // ============================================================================
    // Unit Tests: search
    // ============================================================================

    #[test]
    fn test_search_ranks_exact_first() {
        let service = build_service(vec![
            item(1, "Heat (1995)", &["Action"]),
            item(2, "Heat", &["Drama"]),
            item(3, "White Heat (1949)", &["Crime"]),
        ]);
        let hits = service.search("HEAT", 10).unwrap();

        let positions: Vec<_> = hits.iter().map(|h| h.position).collect();
        assert_eq!(positions, vec![1, 0, 2]);
        assert_eq!(hits[0].strategy, MatchStrategy::Exact);
        assert_eq!(hits[1].strategy, MatchStrategy::Substring);

        assert_eq!(service.search("heat", 1).unwrap().len(), 1);
        assert!(service.search("nothing", 10).unwrap().is_empty());
        assert!(matches!(service.search(" ", 10), Err(RecommendError::InvalidQuery)));
    }

    // ============================================================================
    // Unit Tests: alignment with the matrix
    // ============================================================================

    #[test]
    fn test_matrix_rows_need_not_follow_catalog_order() {
        let catalog = Catalog::from_items(vec![
            item(1, "Toy Story (1995)", &["Animation", "Comedy"]),
            item(2, "Cars (2006)", &["Animation", "Comedy"]),
            item(3, "Saw (2004)", &["Horror"]),
        ])
        .unwrap();

        // Same scores, rows stored as [Saw, Cars, Toy Story]
        let keys = vec![
            RowKey { id: 3, title: "Saw (2004)".to_string() },
            RowKey { id: 2, title: "Cars (2006)".to_string() },
            RowKey { id: 1, title: "Toy Story (1995)".to_string() },
        ];
        let data = vec![
            1.0, 0.0, 0.0, //
            0.0, 1.0, 1.0, //
            0.0, 1.0, 1.0,
        ];
        let matrix = SimilarityMatrix::from_parts(RowIndex::from_keys(keys).unwrap(), data).unwrap();
        let service = RecommendationService::new(Arc::new(catalog), matrix).unwrap();

        let recommendations = service.recommend("toy story (1995)", 2).unwrap();
        assert_eq!(titles(&recommendations), vec!["Cars (2006)", "Saw (2004)"]);
    }

    #[test]
    fn test_missing_row_is_a_mismatch() {
        let catalog = Catalog::from_items(vec![
            item(1, "A", &["X"]),
            item(2, "B", &["Y"]),
        ])
        .unwrap();
        let keys = vec![RowKey { id: 1, title: "A".to_string() }];
        let matrix = SimilarityMatrix::from_parts(RowIndex::from_keys(keys).unwrap(), vec![1.0]).unwrap();

        let err = RecommendationService::new(Arc::new(catalog), matrix).unwrap_err();
        assert!(matches!(err, RecommendError::ArtifactMismatch { title } if title == "B"));
    }

    #[test]
    fn test_id_disagreement_is_a_mismatch() {
        let catalog = Catalog::from_items(vec![item(1, "A", &["X"])]).unwrap();
        let keys = vec![RowKey { id: 99, title: "A".to_string() }];
        let matrix = SimilarityMatrix::from_parts(RowIndex::from_keys(keys).unwrap(), vec![1.0]).unwrap();

        assert!(matches!(
            RecommendationService::new(Arc::new(catalog), matrix),
            Err(RecommendError::ArtifactMismatch { .. })
        ));
    }

    #[test]
    fn test_round_score() {
        assert_eq!(round_score(0.816_496_6), 0.8165);
        assert_eq!(round_score(1.0), 1.0);
        assert_eq!(round_score(0.0), 0.0);
    }
}
