//! Analysis record aggregate and its lifecycle.
//!
//! A record is created `PENDING` with provisional scores and is moved to a
//! terminal state exactly once. [`AnalysisRecord::apply`] is the only way a
//! record changes state; stores call it inside their read-modify-write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::campaign::CampaignContext;
use crate::creative::CreativeMetrics;

/// Analysis processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    /// Created, waiting for the policy review
    #[default]
    Pending,
    /// Workflow acknowledged the review is running
    Processing,
    /// Scored with a policy verdict
    Completed,
    /// Workflow reported failure
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "PENDING",
            AnalysisStatus::Processing => "PROCESSING",
            AnalysisStatus::Completed => "COMPLETED",
            AnalysisStatus::Failed => "FAILED",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final campaign rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Rating {
    Green,
    Yellow,
    Red,
    /// No policy verdict yet
    #[default]
    Pending,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Green => "Green",
            Rating::Yellow => "Yellow",
            Rating::Red => "Red",
            Rating::Pending => "Pending",
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scores and verdict stored on a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResults {
    pub benchmark_score: f64,
    pub dna_score: f64,
    pub predictive_score: f64,
    pub final_rating: Rating,
    pub is_safe: bool,
    pub policy_reason: String,
    #[serde(default)]
    pub review_flagged: bool,
}

impl AnalysisResults {
    /// Placeholder results stored until the policy verdict arrives.
    pub fn provisional(benchmark_score: f64, dna_score: f64) -> Self {
        Self {
            benchmark_score,
            dna_score,
            predictive_score: 0.0,
            final_rating: Rating::Pending,
            is_safe: true,
            policy_reason: "Pending analysis".to_string(),
            review_flagged: false,
        }
    }
}

/// A state change requested against a stored record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordMutation {
    /// Workflow acknowledged; PENDING -> PROCESSING
    MarkProcessing,
    /// Final scores with a policy verdict
    Complete(AnalysisResults),
    /// Workflow failure
    Fail { reason: String },
}

impl RecordMutation {
    pub fn name(&self) -> &'static str {
        match self {
            RecordMutation::MarkProcessing => "mark_processing",
            RecordMutation::Complete(_) => "complete",
            RecordMutation::Fail { .. } => "fail",
        }
    }
}

/// Whether [`AnalysisRecord::apply`] changed the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// Record already past the requested state; left untouched
    Ignored,
}

/// The persisted analysis aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: String,
    pub campaign_context: CampaignContext,
    pub creative_metrics: CreativeMetrics,
    pub results: AnalysisResults,
    pub status: AnalysisStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AnalysisRecord {
    /// Create a new pending record with a fresh id.
    pub fn new_pending(
        campaign_context: CampaignContext,
        creative_metrics: CreativeMetrics,
        results: AnalysisResults,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            campaign_context,
            creative_metrics,
            results,
            status: AnalysisStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply a mutation, guarded by the terminal-state check.
    ///
    /// Terminal records never change. `MarkProcessing` is a no-op unless the
    /// record is still `PENDING`.
    pub fn apply(&mut self, mutation: RecordMutation) -> Transition {
        if self.is_terminal() {
            return Transition::Ignored;
        }

        match mutation {
            RecordMutation::MarkProcessing => {
                if self.status != AnalysisStatus::Pending {
                    return Transition::Ignored;
                }
                self.status = AnalysisStatus::Processing;
            }
            RecordMutation::Complete(results) => {
                self.results = results;
                self.status = AnalysisStatus::Completed;
            }
            RecordMutation::Fail { reason } => {
                // A zero predictive score always classifies as Red.
                self.results.policy_reason = reason;
                self.results.predictive_score = 0.0;
                self.results.final_rating = Rating::Red;
                self.status = AnalysisStatus::Failed;
            }
        }

        self.updated_at = Utc::now();
        Transition::Applied
    }

    /// Human-readable status line for polling clients.
    pub fn status_message(&self) -> String {
        match self.status {
            AnalysisStatus::Pending => "Analysis continuing in background".to_string(),
            AnalysisStatus::Processing => "Policy review in progress".to_string(),
            AnalysisStatus::Completed => "Analysis complete".to_string(),
            AnalysisStatus::Failed => format!("Analysis failed: {}", self.results.policy_reason),
        }
    }
}
