//! HTTP front for the recommendation service.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ApiResult};
pub use handlers::{RecommendRequest, RecommendResponse, RecommendationBody};
pub use routes::create_router;
pub use state::{ApiSettings, AppState};
