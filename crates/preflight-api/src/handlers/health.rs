//! Health check handlers.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub store_backend: String,
    pub review_mode: String,
    pub review_configured: bool,
}

/// Readiness endpoint: reports how the service is wired.
pub async fn ready(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let config = state.orchestrator.config();
    Json(ReadinessResponse {
        status: "ready".to_string(),
        store_backend: state.orchestrator.store().backend().to_string(),
        review_mode: format!("{:?}", config.review_mode).to_lowercase(),
        review_configured: config.video_endpoint().is_some() || config.landing_page_endpoint().is_some(),
    })
}
