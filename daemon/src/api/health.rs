//! Health check endpoint

use axum::{Json, Router, extract::State, routing::get};

use super::{
    errors::{ApiError, route_not_found},
    wire::HealthResponse,
};
use crate::AppState;

/// GET /health
///
/// Reports the module name and version, and the number of stored songs.
/// Answers `503 store_unavailable` when the song database can't be reached.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let songs = state.store.count().await.map_err(ApiError::store)?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        module: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        songs,
    }))
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check).fallback(route_not_found))
}
