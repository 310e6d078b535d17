//! Hybrid sync/async policy-review orchestration.
//!
//! # Flow
//! 1. Validate the campaign, resolve creative metrics, persist a `PENDING`
//!    record with provisional scores
//! 2. Hybrid mode: trigger the workflow on a detached task and race it
//!    against the soft timeout
//!    - reply first: re-read the record; finished only if the callback landed
//!    - timeout first: answer "accepted"; the callback finishes the record
//! 3. Direct mode: run both blocking reviews concurrently and finalize inline
//!
//! Whatever wins, the record reaches its terminal state exactly once through
//! the store's terminal-guarded update.

use std::sync::Arc;
use std::time::Instant;

use preflight_models::{
    AnalysisRecord, AnalysisResults, AnalysisStatus, CampaignContext, PolicyCallback, PolicyResult, PolicyVerdict,
    RecordMutation,
};
use preflight_review::{ReviewClient, TriggerPayload};
use preflight_scoring::ScoringEngine;
use preflight_store::AnalysisRecordStore;
use serde::Serialize;
use tracing::{debug, warn, Instrument};

use crate::callback::{CallbackHandler, CallbackOutcome};
use crate::config::{PreflightConfig, ReviewMode};
use crate::creative::CreativeSource;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::logging::AnalysisLogger;
use crate::metrics::{record_submission, record_trigger_latency};

/// Result of a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Finished within the request
    Completed(AnalysisRecord),
    /// Still running; poll the status or wait for the callback
    Accepted { analysis_id: String },
}

impl SubmitOutcome {
    pub fn analysis_id(&self) -> &str {
        match self {
            SubmitOutcome::Completed(record) => &record.id,
            SubmitOutcome::Accepted { analysis_id } => analysis_id,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmitOutcome::Completed(_) => "completed",
            SubmitOutcome::Accepted { .. } => "accepted",
        }
    }
}

/// Polling view of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub analysis_id: String,
    pub status: AnalysisStatus,
    pub results: AnalysisResults,
    pub message: String,
}

impl From<&AnalysisRecord> for StatusView {
    fn from(record: &AnalysisRecord) -> Self {
        Self {
            analysis_id: record.id.clone(),
            status: record.status,
            results: record.results.clone(),
            message: record.status_message(),
        }
    }
}

#[derive(Clone)]
pub struct PolicyOrchestrator {
    config: Arc<PreflightConfig>,
    store: Arc<dyn AnalysisRecordStore>,
    review: ReviewClient,
    scoring: Arc<ScoringEngine>,
    callbacks: CallbackHandler,
}

impl PolicyOrchestrator {
    pub fn new(config: PreflightConfig, store: Arc<dyn AnalysisRecordStore>) -> OrchestratorResult<Self> {
        let review = ReviewClient::new(config.review_client_config())?;
        let scoring = Arc::new(ScoringEngine::new(config.benchmark_table()));
        let callbacks = CallbackHandler::new(Arc::clone(&store), Arc::clone(&scoring), config.review_flag_policy);

        Ok(Self {
            config: Arc::new(config),
            store,
            review,
            scoring,
            callbacks,
        })
    }

    pub fn config(&self) -> &PreflightConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn AnalysisRecordStore> {
        &self.store
    }

    pub fn callbacks(&self) -> &CallbackHandler {
        &self.callbacks
    }

    /// Create an analysis and run its policy review.
    ///
    /// `callback_url` is where the workflow reports back in hybrid mode.
    pub async fn submit_analysis(
        &self,
        context: CampaignContext,
        creative: CreativeSource,
        callback_url: &str,
    ) -> OrchestratorResult<SubmitOutcome> {
        let result = self.submit(context, creative, callback_url).await;
        record_submission(match &result {
            Ok(outcome) => outcome.as_str(),
            Err(OrchestratorError::Validation(_)) => "rejected",
            Err(_) => "error",
        });
        result
    }

    async fn submit(
        &self,
        context: CampaignContext,
        creative: CreativeSource,
        callback_url: &str,
    ) -> OrchestratorResult<SubmitOutcome> {
        let context = context.normalized();
        context.validate()?;

        let metrics = creative.resolve(&self.config.scene_cut).await;
        let provisional = self.scoring.provisional(&context, &metrics);
        let record = AnalysisRecord::new_pending(context, metrics, provisional);
        self.store.create(record.clone()).await?;

        let logger = AnalysisLogger::new(&record.id, "submit_analysis");
        logger.log_start(&format!(
            "industry={} benchmark={:.2} dna={:.2} mode={:?}",
            record.campaign_context.industry,
            record.results.benchmark_score,
            record.results.dna_score,
            self.config.review_mode
        ));

        let span = logger.create_span();
        match self.config.review_mode {
            ReviewMode::Hybrid => self.run_hybrid(record, callback_url, &logger).instrument(span).await,
            ReviewMode::Direct => self.run_direct(record, &logger).instrument(span).await,
        }
    }

    async fn run_hybrid(
        &self,
        record: AnalysisRecord,
        callback_url: &str,
        logger: &AnalysisLogger,
    ) -> OrchestratorResult<SubmitOutcome> {
        let Some(endpoint) = self.config.trigger_endpoint(&record.campaign_context) else {
            logger.log_progress("No review workflow configured, checks skipped");
            return Ok(self.finalize(&record, &PolicyVerdict::skipped(), logger).await);
        };

        let payload = TriggerPayload::new(&record.id, callback_url, &record.campaign_context);
        let review = self.review.clone();
        let endpoint = endpoint.to_string();
        let background = logger.clone();

        // Detached: keeps running past the soft timeout, the callback finishes the record.
        let trigger = tokio::spawn(async move {
            let started = Instant::now();
            let result = review.trigger(&endpoint, &payload).await;
            match &result {
                Ok(_) => record_trigger_latency("ok", started.elapsed()),
                Err(e) => {
                    record_trigger_latency("error", started.elapsed());
                    background.log_warning(&format!("Review trigger failed: {}", e));
                }
            }
            result
        });

        let soft_timeout = self.config.soft_timeout();
        match tokio::time::timeout(soft_timeout, trigger).await {
            Err(_) => {
                logger.log_progress(&format!(
                    "No reply within {:?}, completion continues via callback",
                    soft_timeout
                ));
                Ok(SubmitOutcome::Accepted {
                    analysis_id: record.id,
                })
            }
            Ok(Err(join_error)) => Err(OrchestratorError::internal(format!(
                "Review trigger task failed: {}",
                join_error
            ))),
            Ok(Ok(Err(e))) => {
                logger.log_error(&format!("Review trigger failed, record left pending: {}", e));
                Err(e.into())
            }
            Ok(Ok(Ok(reply))) => self.handle_sync_reply(&record.id, reply, logger).await,
        }
    }

    /// A reply arrived before the soft timeout.
    ///
    /// The reply only signals that the workflow finished; its body is never
    /// applied. The workflow's own callback is the writer, so the record is
    /// re-read and returned if that callback already landed.
    async fn handle_sync_reply(
        &self,
        analysis_id: &str,
        reply: serde_json::Value,
        logger: &AnalysisLogger,
    ) -> OrchestratorResult<SubmitOutcome> {
        debug!(analysis_id = %analysis_id, has_body = !reply.is_null(), "Review trigger replied");

        match self.store.get(analysis_id).await {
            Ok(record) if record.is_terminal() => {
                logger.log_completion("Finished before the trigger replied");
                Ok(SubmitOutcome::Completed(record))
            }
            Ok(_) => Ok(SubmitOutcome::Accepted {
                analysis_id: analysis_id.to_string(),
            }),
            Err(e) => {
                warn!(analysis_id = %analysis_id, "Could not re-read record after trigger reply: {}", e);
                Ok(SubmitOutcome::Accepted {
                    analysis_id: analysis_id.to_string(),
                })
            }
        }
    }

    async fn run_direct(&self, record: AnalysisRecord, logger: &AnalysisLogger) -> OrchestratorResult<SubmitOutcome> {
        let context = &record.campaign_context;
        let (video, landing_page) = tokio::join!(self.check_video(context), self.check_landing_page(context));

        let verdict = PolicyVerdict::aggregate(&video, &landing_page, self.config.review_flag_policy);
        Ok(self.finalize(&record, &verdict, logger).await)
    }

    async fn check_video(&self, context: &CampaignContext) -> PolicyResult {
        let (Some(endpoint), Some(video_url)) = (self.config.video_endpoint(), context.video_url.as_deref()) else {
            return PolicyResult::skipped("Video");
        };
        self.review
            .check_video(endpoint, video_url)
            .await
            .unwrap_or_else(|e| PolicyResult::unsafe_because(format!("Video analysis failed: {}", e)))
    }

    async fn check_landing_page(&self, context: &CampaignContext) -> PolicyResult {
        let (Some(endpoint), Some(landing_page_url)) =
            (self.config.landing_page_endpoint(), context.landing_page_url.as_deref())
        else {
            return PolicyResult::skipped("Landing page");
        };
        self.review
            .check_landing_page(endpoint, landing_page_url)
            .await
            .unwrap_or_else(|e| PolicyResult::unsafe_because(format!("LP analysis failed: {}", e)))
    }

    /// Score and complete inline. A failed write is logged and the locally
    /// scored record is returned.
    async fn finalize(&self, record: &AnalysisRecord, verdict: &PolicyVerdict, logger: &AnalysisLogger) -> SubmitOutcome {
        let results = self
            .scoring
            .score(&record.campaign_context, &record.creative_metrics, verdict);

        match self
            .store
            .update(&record.id, RecordMutation::Complete(results.clone()))
            .await
        {
            Ok(outcome) => {
                logger.log_completion(&format!(
                    "rating={} predictive={:.2} reason={}",
                    outcome.record.results.final_rating,
                    outcome.record.results.predictive_score,
                    outcome.record.results.policy_reason
                ));
                SubmitOutcome::Completed(outcome.record)
            }
            Err(e) => {
                warn!(analysis_id = %record.id, "Failed to persist final results: {}", e);
                let mut best_effort = record.clone();
                best_effort.apply(RecordMutation::Complete(results));
                SubmitOutcome::Completed(best_effort)
            }
        }
    }

    pub async fn get_status(&self, analysis_id: &str) -> OrchestratorResult<StatusView> {
        let record = self.store.get(analysis_id).await?;
        Ok(StatusView::from(&record))
    }

    pub async fn handle_callback(&self, payload: &PolicyCallback) -> OrchestratorResult<CallbackOutcome> {
        self.callbacks.handle_callback(payload).await
    }
}
