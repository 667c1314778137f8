//! Server crate for the ReelRecs recommendation engine.
//!
//! This crate contains the online half of the system:
//! - [`RecommendationService`] resolves a title and ranks its neighbors
//! - [`http`] exposes the service over a small JSON API
//! - [`Config`] reads the `RECS_*` environment

pub mod config;
pub mod error;
pub mod http;
pub mod resolver;

pub use config::Config;
pub use error::{RecommendError, Result};
pub use resolver::{MatchStrategy, Recommendation, RecommendationService, Resolved, SearchHit};
