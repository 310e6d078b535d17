//! In-memory record store.

use std::collections::HashMap;

use async_trait::async_trait;
use preflight_models::{AnalysisRecord, RecordMutation};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::store::{AnalysisRecordStore, UpdateOutcome};

/// Records kept in a process-local map.
///
/// Updates run under the write lock, which makes the terminal-state guard
/// atomic with respect to concurrent callbacks.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<String, AnalysisRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl AnalysisRecordStore for InMemoryRecordStore {
    async fn create(&self, record: AnalysisRecord) -> StoreResult<String> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists(record.id));
        }
        let id = record.id.clone();
        records.insert(id.clone(), record);
        Ok(id)
    }

    async fn get(&self, id: &str) -> StoreResult<AnalysisRecord> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(id))
    }

    async fn update(&self, id: &str, mutation: RecordMutation) -> StoreResult<UpdateOutcome> {
        let mut records = self.records.write().await;
        let record = records.get_mut(id).ok_or_else(|| StoreError::not_found(id))?;

        let name = mutation.name();
        let transition = record.apply(mutation);
        debug!(analysis_id = %id, mutation = name, ?transition, status = %record.status, "Record update");

        Ok(UpdateOutcome::new(record.clone(), transition))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preflight_models::{
        AnalysisResults, AnalysisStatus, CampaignContext, CreativeMetrics, Rating, Transition,
    };
    use std::sync::Arc;

    fn pending() -> AnalysisRecord {
        AnalysisRecord::new_pending(
            CampaignContext::new("apps", 10.0, 500.0, "US"),
            CreativeMetrics::default(),
            AnalysisResults::provisional(40.0, 0.0),
        )
    }

    fn completed_results(rating: Rating) -> AnalysisResults {
        AnalysisResults {
            final_rating: rating,
            policy_reason: "Policy Safe".into(),
            ..AnalysisResults::provisional(40.0, 0.0)
        }
    }

    #[tokio::test]
    async fn test_create_get() {
        let store = InMemoryRecordStore::new();
        let record = pending();
        let id = store.create(record.clone()).await.unwrap();
        assert_eq!(id, record.id);
        assert_eq!(store.get(&id).await.unwrap(), record);
        assert!(matches!(store.create(record).await, Err(StoreError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = InMemoryRecordStore::new();
        assert!(store.get("nope").await.unwrap_err().is_not_found());
        let err = store.update("nope", RecordMutation::MarkProcessing).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_terminal_guard() {
        let store = InMemoryRecordStore::new();
        let id = store.create(pending()).await.unwrap();

        let first = store
            .update(&id, RecordMutation::Complete(completed_results(Rating::Red)))
            .await
            .unwrap();
        assert!(first.applied());
        assert_eq!(first.record.status, AnalysisStatus::Completed);

        let second = store
            .update(&id, RecordMutation::Fail { reason: "late".into() })
            .await
            .unwrap();
        assert_eq!(second.transition, Transition::Ignored);
        assert_eq!(second.record.status, AnalysisStatus::Completed);
        assert_eq!(second.record.results.final_rating, Rating::Red);
    }

    #[tokio::test]
    async fn test_concurrent_completions_apply_once() {
        let store = Arc::new(InMemoryRecordStore::new());
        let id = store.create(pending()).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                let mutation = if i % 2 == 0 {
                    RecordMutation::Complete(completed_results(Rating::Green))
                } else {
                    RecordMutation::Fail { reason: format!("worker {}", i) }
                };
                store.update(&id, mutation).await.unwrap().applied()
            }));
        }

        let mut applied = 0;
        for handle in handles {
            if handle.await.unwrap() {
                applied += 1;
            }
        }
        assert_eq!(applied, 1);
        assert!(store.get(&id).await.unwrap().is_terminal());
    }
}
