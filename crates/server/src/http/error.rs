use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::error;

use crate::error::RecommendError;

/// Errors a request can end in
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// The body was not JSON, or not the JSON we expect
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Need 'movie_title' in your request")]
    MissingTitle,

    #[error(transparent)]
    Recommend(#[from] RecommendError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

fn example() -> Value {
    json!({ "movie_title": "Toy Story (1995)" })
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::InvalidRequest(detail) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Invalid request",
                    "message": format!("Please send JSON data: {detail}"),
                }),
            ),
            ApiError::MissingTitle => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Missing field",
                    "message": self.to_string(),
                    "example": example(),
                }),
            ),
            ApiError::Recommend(RecommendError::InvalidQuery) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Invalid input",
                    "message": self.to_string(),
                }),
            ),
            ApiError::Recommend(RecommendError::NotFound { .. }) => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "Movie not found",
                    "message": self.to_string(),
                    "suggestion": "Try including the year in the title",
                }),
            ),
            ApiError::Recommend(RecommendError::NotReady) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({
                    "error": "Service not ready",
                    "message": "Catalog and similarity matrix are not loaded yet",
                }),
            ),
            ApiError::Recommend(_) | ApiError::Internal(_) => {
                error!("Request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "Server error",
                        "message": "Something went wrong",
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
