//! Policy-review callback handling.
//!
//! The handler is the only path through which workflow results reach a
//! record's terminal state. Every write goes through the store's
//! terminal-guarded update, so duplicate and late callbacks are no-ops.

use std::sync::Arc;

use preflight_models::{
    AnalysisRecord, PolicyCallback, PolicyResult, PolicyResults, PolicyVerdict, RecordMutation, ReviewFlagPolicy,
    Transition,
};
use preflight_scoring::ScoringEngine;
use preflight_store::AnalysisRecordStore;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::logging::AnalysisLogger;
use crate::metrics::record_callback;

/// Reason stored when the workflow fails without an error message.
pub const DEFAULT_FAILURE_REASON: &str = "Policy review workflow failed";

/// What a callback did to its record.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    /// Record moved to a terminal state
    Updated(AnalysisRecord),
    /// Progress acknowledged; record is not terminal
    Acknowledged(AnalysisRecord),
    /// Record was already terminal; nothing changed
    AlreadyFinal(AnalysisRecord),
}

impl CallbackOutcome {
    pub fn record(&self) -> &AnalysisRecord {
        match self {
            CallbackOutcome::Updated(r) | CallbackOutcome::Acknowledged(r) | CallbackOutcome::AlreadyFinal(r) => r,
        }
    }

    pub fn into_record(self) -> AnalysisRecord {
        match self {
            CallbackOutcome::Updated(r) | CallbackOutcome::Acknowledged(r) | CallbackOutcome::AlreadyFinal(r) => r,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackOutcome::Updated(_) => "updated",
            CallbackOutcome::Acknowledged(_) => "acknowledged",
            CallbackOutcome::AlreadyFinal(_) => "already_final",
        }
    }
}

#[derive(Clone)]
pub struct CallbackHandler {
    store: Arc<dyn AnalysisRecordStore>,
    scoring: Arc<ScoringEngine>,
    review_flag_policy: ReviewFlagPolicy,
}

impl CallbackHandler {
    pub fn new(
        store: Arc<dyn AnalysisRecordStore>,
        scoring: Arc<ScoringEngine>,
        review_flag_policy: ReviewFlagPolicy,
    ) -> Self {
        Self {
            store,
            scoring,
            review_flag_policy,
        }
    }

    /// Verdict over a callback's results; a missing dimension counts as skipped.
    pub fn verdict(&self, results: Option<&PolicyResults>) -> PolicyVerdict {
        let video = results
            .and_then(|r| r.video.clone())
            .unwrap_or_else(|| PolicyResult::skipped("Video"));
        let landing_page = results
            .and_then(|r| r.landing_page.clone())
            .unwrap_or_else(|| PolicyResult::skipped("Landing page"));
        PolicyVerdict::aggregate(&video, &landing_page, self.review_flag_policy)
    }

    /// Apply a workflow callback to its record.
    pub async fn handle_callback(&self, payload: &PolicyCallback) -> OrchestratorResult<CallbackOutcome> {
        let result = self.apply(payload).await;
        record_callback(match &result {
            Ok(outcome) => outcome.as_str(),
            Err(_) => "error",
        });
        result
    }

    async fn apply(&self, payload: &PolicyCallback) -> OrchestratorResult<CallbackOutcome> {
        let analysis_id = payload
            .analysis_id()
            .ok_or_else(|| OrchestratorError::bad_request("Missing analysis_id"))?;
        let logger = AnalysisLogger::new(analysis_id, "policy_callback");

        let mutation = if payload.is_failure() {
            let reason = payload.error_message().unwrap_or(DEFAULT_FAILURE_REASON);
            logger.log_warning(&format!("Workflow reported failure: {}", reason));
            RecordMutation::Fail {
                reason: reason.to_string(),
            }
        } else if payload.is_progress() {
            // Also covers unknown statuses without results; never a verdict.
            RecordMutation::MarkProcessing
        } else {
            let record = self.store.get(analysis_id).await?;
            if record.is_terminal() {
                logger.log_progress("Duplicate callback for finished analysis ignored");
                return Ok(CallbackOutcome::AlreadyFinal(record));
            }
            let verdict = self.verdict(payload.policy_results.as_ref());
            RecordMutation::Complete(
                self.scoring
                    .score(&record.campaign_context, &record.creative_metrics, &verdict),
            )
        };

        let finishing = !matches!(mutation, RecordMutation::MarkProcessing);
        let outcome = self.store.update(analysis_id, mutation).await?;
        let record = outcome.record;

        Ok(match outcome.transition {
            Transition::Applied if finishing => {
                logger.log_completion(&format!(
                    "status={} rating={} reason={}",
                    record.status, record.results.final_rating, record.results.policy_reason
                ));
                CallbackOutcome::Updated(record)
            }
            Transition::Applied => {
                logger.log_progress("Policy review in progress");
                CallbackOutcome::Acknowledged(record)
            }
            Transition::Ignored if record.is_terminal() => {
                logger.log_progress("Duplicate callback for finished analysis ignored");
                CallbackOutcome::AlreadyFinal(record)
            }
            Transition::Ignored => CallbackOutcome::Acknowledged(record),
        })
    }
}
