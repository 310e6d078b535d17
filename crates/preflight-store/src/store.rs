//! Record store abstraction.

use async_trait::async_trait;
use preflight_models::{AnalysisRecord, RecordMutation, Transition};

use crate::error::StoreResult;

/// Result of a guarded update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    /// Record after the update attempt
    pub record: AnalysisRecord,
    pub transition: Transition,
}

impl UpdateOutcome {
    pub fn new(record: AnalysisRecord, transition: Transition) -> Self {
        Self { record, transition }
    }

    pub fn applied(&self) -> bool {
        self.transition == Transition::Applied
    }
}

/// Persistence for analysis records.
///
/// `update` is an atomic keyed read-modify-write that runs
/// [`AnalysisRecord::apply`], so terminal records are never overwritten
/// regardless of how updates interleave.
#[async_trait]
pub trait AnalysisRecordStore: Send + Sync {
    /// Persist a new record and return its id.
    async fn create(&self, record: AnalysisRecord) -> StoreResult<String>;

    /// Fetch a record; `StoreError::NotFound` when absent.
    async fn get(&self, id: &str) -> StoreResult<AnalysisRecord>;

    /// Apply a mutation under the terminal-state guard.
    async fn update(&self, id: &str, mutation: RecordMutation) -> StoreResult<UpdateOutcome>;

    /// Backend name for logs and metrics.
    fn backend(&self) -> &'static str;
}
