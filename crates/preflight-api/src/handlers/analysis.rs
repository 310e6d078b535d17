//! Analysis submission and status handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use preflight_models::{AnalysisResults, AnalysisStatus, CampaignContext, CreativeMetrics};
use preflight_orchestrator::{StatusView, SubmitOutcome};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::handlers::webhook::WEBHOOK_PATH;
use crate::state::AppState;

/// Analysis request: campaign fields at the top level plus optional
/// client-side creative metrics.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(flatten)]
    pub campaign: CampaignContext,
    #[serde(default)]
    pub creative_metrics: Option<CreativeMetrics>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub message: String,
    pub analysis_id: String,
    pub status: AnalysisStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<AnalysisResults>,
}

/// Submit an analysis.
///
/// 200 with results when the review finished in time, 202 when it
/// continues in the background.
pub async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AnalyzeResponse>)> {
    let Json(request) = payload.map_err(|e| ApiError::validation(e.body_text()))?;

    let callback_url = state
        .orchestrator
        .config()
        .callback_url_or(derived_callback_url(&headers));

    let outcome = state
        .orchestrator
        .submit_analysis(request.campaign, request.creative_metrics.into(), &callback_url)
        .await?;

    info!(analysis_id = %outcome.analysis_id(), outcome = outcome.as_str(), "Analysis submitted");

    Ok(match outcome {
        SubmitOutcome::Completed(record) => (
            StatusCode::OK,
            Json(AnalyzeResponse {
                message: "Analysis Completed".to_string(),
                analysis_id: record.id,
                status: record.status,
                results: Some(record.results),
            }),
        ),
        SubmitOutcome::Accepted { analysis_id } => (
            StatusCode::ACCEPTED,
            Json(AnalyzeResponse {
                message: "Analysis continuing in background".to_string(),
                analysis_id,
                status: AnalysisStatus::Pending,
                results: None,
            }),
        ),
    })
}

/// Poll an analysis.
pub async fn get_analysis_status(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
) -> ApiResult<Json<StatusView>> {
    Ok(Json(state.orchestrator.get_status(&analysis_id).await?))
}

/// Callback URL as seen by the caller, honouring proxy headers.
fn derived_callback_url(headers: &HeaderMap) -> String {
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("https");
    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(header::HOST))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{}://{}{}", proto, host, WEBHOOK_PATH)
}
