//! Index page
//!
//! - GET / - Entity counts and the session visit counter

use axum::{extract::State, routing::get, Json, Router};

use crate::api::middleware::{ApiError, AppState, AuthenticatedRedactor};
use crate::services::IndexStats;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

/// Each call counts as one more visit for the caller's session
async fn index(
    State(state): State<AppState>,
    auth: AuthenticatedRedactor,
) -> Result<Json<IndexStats>, ApiError> {
    Ok(Json(state.stats_service.index(&auth.session_id).await?))
}
