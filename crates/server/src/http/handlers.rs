use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::error::RecommendError;
use crate::resolver::Recommendation;

use super::error::{ApiError, ApiResult};
use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    /// `None` when the key is absent, `Some(None)` when it is `null`
    #[serde(default, deserialize_with = "present")]
    pub movie_title: Option<Option<String>>,
    pub top_n: Option<usize>,
}

/// Marks a key as present, whatever its value
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RecommendationBody {
    pub title: String,
    pub genres: String,
    pub similarity_score: f32,
}

impl RecommendationBody {
    fn new(recommendation: Recommendation, delimiter: char) -> Self {
        Self {
            genres: recommendation.tags.join(&delimiter.to_string()),
            title: recommendation.title,
            similarity_score: recommendation.score,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RecommendResponse {
    pub query: String,
    pub recommendations: Vec<RecommendationBody>,
    pub count: usize,
}

// Handlers

/// API info
pub async fn home(State(state): State<AppState>) -> Json<Value> {
    let total_movies = state.service().map(|s| s.len()).unwrap_or(0);
    let status = if state.is_ready() { "running" } else { "loading" };

    Json(json!({
        "message": "Movie Recommendation API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/recommend": {
                "method": "POST",
                "description": "Get movie recommendations",
                "input": { "movie_title": "string", "top_n": "integer (optional)" },
                "example": { "movie_title": "Toy Story (1995)" }
            },
            "/health": {
                "method": "GET",
                "description": "Readiness check"
            }
        },
        "status": status,
        "total_movies": total_movies,
    }))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if state.is_ready() {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not ready" })),
        )
    }
}

/// Recommendations for one title
pub async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> ApiResult<Json<RecommendResponse>> {
    let service = state.service()?;
    let Json(request) = payload.map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;
    let query = request
        .movie_title
        .ok_or(ApiError::MissingTitle)?
        .ok_or(RecommendError::InvalidQuery)?;
    let top_n = state.top_n(request.top_n);

    // The ranking is CPU-bound; keep it off the async workers
    let lookup = query.clone();
    let recommendations = tokio::task::spawn_blocking(move || service.recommend(&lookup, top_n))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    info!("Served {} recommendations for '{}'", recommendations.len(), query.trim());

    let delimiter = state.settings.tag_delimiter;
    let recommendations: Vec<RecommendationBody> = recommendations
        .into_iter()
        .map(|r| RecommendationBody::new(r, delimiter))
        .collect();

    Ok(Json(RecommendResponse {
        query,
        count: recommendations.len(),
        recommendations,
    }))
}

/// Wrong method on a known route
pub async fn method_not_allowed() -> (StatusCode, Json<Value>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "error": "Method not allowed",
            "message": "Use POST for /recommend",
        })),
    )
}

/// Anything not routed
pub async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Endpoint not found",
            "message": "This endpoint doesn't exist",
            "available_endpoints": ["/", "/health", "/recommend"],
        })),
    )
}
