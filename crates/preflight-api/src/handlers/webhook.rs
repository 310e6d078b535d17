//! Review workflow callback handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use preflight_models::{AnalysisStatus, PolicyCallback};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Path the workflow POSTs results to.
pub const WEBHOOK_PATH: &str = "/api/webhook/policy-result";

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: String,
    pub message: String,
    pub analysis_id: String,
    pub outcome: String,
    pub record_status: AnalysisStatus,
}

/// Receive a policy result. Duplicate and late callbacks answer 200.
pub async fn policy_result(
    State(state): State<AppState>,
    payload: Result<Json<PolicyCallback>, JsonRejection>,
) -> ApiResult<Json<WebhookResponse>> {
    let Json(callback) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let outcome = state.orchestrator.handle_callback(&callback).await?;
    let record = outcome.record();

    let message = match outcome.as_str() {
        "updated" => "Analysis updated successfully",
        "acknowledged" => "Progress acknowledged",
        _ => "Analysis already finalized",
    };

    Ok(Json(WebhookResponse {
        status: "ok".to_string(),
        message: message.to_string(),
        analysis_id: record.id.clone(),
        outcome: outcome.as_str().to_string(),
        record_status: record.status,
    }))
}
