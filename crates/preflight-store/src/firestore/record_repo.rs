//! Analysis record repository backed by Firestore.

use std::collections::HashMap;

use async_trait::async_trait;
use preflight_models::{AnalysisRecord, RecordMutation, Transition};
use tracing::{debug, info, warn};

use super::client::FirestoreClient;
use super::error::FirestoreError;
use super::metrics::record_update_conflict;
use super::types::{fields_to_json, Document, ToFirestoreValue, Value};
use crate::error::{StoreError, StoreResult};
use crate::store::{AnalysisRecordStore, UpdateOutcome};

/// Default collection for analysis records.
pub const DEFAULT_COLLECTION: &str = "preflight_analyses";

/// Attempts of the read-apply-write cycle before giving up on contention.
const MAX_CONFLICT_RETRIES: u32 = 5;

/// Record store using one Firestore document per analysis.
///
/// Updates are read-apply-write guarded by the document's `updateTime`,
/// so a concurrent writer forces a re-read and the terminal-state guard
/// runs again on fresh data.
#[derive(Clone)]
pub struct FirestoreRecordStore {
    client: FirestoreClient,
    collection: String,
}

impl FirestoreRecordStore {
    pub fn new(client: FirestoreClient) -> Self {
        Self::with_collection(client, DEFAULT_COLLECTION)
    }

    pub fn with_collection(client: FirestoreClient, collection: impl Into<String>) -> Self {
        Self {
            client,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    async fn fetch(&self, id: &str) -> StoreResult<Option<Document>> {
        let doc = self
            .client
            .with_retry("get_record", || self.client.get_document(&self.collection, id))
            .await?;
        Ok(doc)
    }
}

fn record_to_fields(record: &AnalysisRecord) -> StoreResult<HashMap<String, Value>> {
    let json = serde_json::to_value(record).map_err(|e| StoreError::encoding(e.to_string()))?;
    match json {
        serde_json::Value::Object(map) => Ok(map
            .iter()
            .map(|(k, v)| (k.clone(), v.to_firestore_value()))
            .collect()),
        _ => Err(StoreError::encoding("analysis record did not serialize to an object")),
    }
}

fn document_to_record(doc: &Document) -> StoreResult<AnalysisRecord> {
    let map = fields_to_json(doc.fields.as_ref())
        .ok_or_else(|| StoreError::encoding("document has an undecodable field"))?;
    serde_json::from_value(serde_json::Value::Object(map)).map_err(|e| StoreError::encoding(e.to_string()))
}

#[async_trait]
impl AnalysisRecordStore for FirestoreRecordStore {
    async fn create(&self, record: AnalysisRecord) -> StoreResult<String> {
        let fields = record_to_fields(&record)?;
        match self
            .client
            .create_document(&self.collection, &record.id, fields)
            .await
        {
            Ok(_) => {
                info!(analysis_id = %record.id, "Created analysis record");
                Ok(record.id)
            }
            Err(FirestoreError::AlreadyExists(_)) => Err(StoreError::AlreadyExists(record.id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: &str) -> StoreResult<AnalysisRecord> {
        let doc = self.fetch(id).await?.ok_or_else(|| StoreError::not_found(id))?;
        document_to_record(&doc)
    }

    async fn update(&self, id: &str, mutation: RecordMutation) -> StoreResult<UpdateOutcome> {
        let name = mutation.name();

        for attempt in 0..MAX_CONFLICT_RETRIES {
            let doc = self.fetch(id).await?.ok_or_else(|| StoreError::not_found(id))?;
            let mut record = document_to_record(&doc)?;

            if record.apply(mutation.clone()) == Transition::Ignored {
                debug!(analysis_id = %id, mutation = name, status = %record.status, "Record update ignored");
                return Ok(UpdateOutcome::new(record, Transition::Ignored));
            }

            // Without a revision the write could not be guarded against a concurrent update.
            let Some(update_time) = doc.update_time.as_deref() else {
                warn!(analysis_id = %id, mutation = name, "Record has no updateTime, refusing unguarded write");
                return Err(StoreError::Conflict(id.to_string()));
            };

            let fields = record_to_fields(&record)?;
            match self
                .client
                .update_document_with_precondition(&self.collection, id, fields, update_time)
                .await
            {
                Ok(_) => {
                    debug!(analysis_id = %id, mutation = name, status = %record.status, "Record updated");
                    return Ok(UpdateOutcome::new(record, Transition::Applied));
                }
                Err(e) if e.is_precondition_failed() => {
                    record_update_conflict();
                    warn!(analysis_id = %id, attempt = attempt + 1, "Record changed concurrently, re-reading");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::Conflict(id.to_string()))
    }

    fn backend(&self) -> &'static str {
        "firestore"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firestore::client::FirestoreConfig;
    use crate::firestore::retry::RetryConfig;
    use preflight_models::{AnalysisResults, AnalysisStatus, CampaignContext, CreativeMetrics, Rating};
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DOC_PATH: &str = "/v1/projects/test-project/databases/(default)/documents/preflight_analyses/rec-1";

    async fn store(server: &MockServer) -> FirestoreRecordStore {
        let config = FirestoreConfig {
            project_id: "test-project".to_string(),
            database_id: "(default)".to_string(),
            emulator_url: Some(server.uri()),
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig {
                max_retries: 0,
                ..RetryConfig::default()
            },
        };
        FirestoreRecordStore::new(FirestoreClient::new(config).await.unwrap())
    }

    fn record() -> AnalysisRecord {
        let mut record = AnalysisRecord::new_pending(
            CampaignContext::new("games", 15.0, 1000.0, "US"),
            CreativeMetrics::new(70.0, 65.0, true, 20.0),
            AnalysisResults::provisional(100.0, 69.5),
        );
        record.id = "rec-1".to_string();
        record
    }

    fn document(record: &AnalysisRecord, update_time: &str) -> serde_json::Value {
        let fields = record_to_fields(record).unwrap();
        serde_json::json!({
            "name": format!("projects/test-project/databases/(default)/documents/preflight_analyses/{}", record.id),
            "fields": fields,
            "updateTime": update_time,
        })
    }

    #[test]
    fn test_record_fields_round_trip() {
        let record = record();
        let fields = record_to_fields(&record).unwrap();
        assert!(matches!(fields.get("status"), Some(Value::StringValue(s)) if s == "PENDING"));

        let doc = Document::new(fields);
        assert_eq!(document_to_record(&doc).unwrap(), record);
    }

    #[test]
    fn test_undecodable_document() {
        let doc = Document::new(HashMap::from([("status".to_string(), Value::StringValue("???".into()))]));
        assert!(matches!(document_to_record(&doc), Err(StoreError::Encoding(_))));
    }

    #[tokio::test]
    async fn test_get_missing_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DOC_PATH))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = store(&server).await.get("rec-1").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_conflict_maps_to_already_exists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(query_param("documentId", "rec-1"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let err = store(&server).await.create(record()).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(id) if id == "rec-1"));
    }

    #[tokio::test]
    async fn test_update_applies_with_precondition() {
        let server = MockServer::start().await;
        let record = record();
        Mock::given(method("GET"))
            .and(path(DOC_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(document(&record, "2026-01-01T00:00:00.000001Z")))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path(DOC_PATH))
            .and(query_param("currentDocument.updateTime", "2026-01-01T00:00:00.000001Z"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let results = AnalysisResults {
            predictive_score: 79.9,
            final_rating: Rating::Yellow,
            policy_reason: "Policy Safe".into(),
            ..AnalysisResults::provisional(100.0, 69.5)
        };
        let outcome = store(&server)
            .await
            .update("rec-1", RecordMutation::Complete(results))
            .await
            .unwrap();
        assert!(outcome.applied());
        assert_eq!(outcome.record.status, AnalysisStatus::Completed);
        assert_eq!(outcome.record.results.final_rating, Rating::Yellow);
    }

    #[tokio::test]
    async fn test_update_on_terminal_record_is_ignored() {
        let server = MockServer::start().await;
        let mut record = record();
        record.apply(RecordMutation::Fail { reason: "boom".into() });
        Mock::given(method("GET"))
            .and(path(DOC_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(document(&record, "2026-01-01T00:00:00Z")))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let outcome = store(&server)
            .await
            .update("rec-1", RecordMutation::MarkProcessing)
            .await
            .unwrap();
        assert_eq!(outcome.transition, Transition::Ignored);
        assert_eq!(outcome.record.status, AnalysisStatus::Failed);
    }

    #[tokio::test]
    async fn test_update_without_update_time_is_not_written() {
        let server = MockServer::start().await;
        let record = record();
        let mut doc = document(&record, "unused");
        doc.as_object_mut().unwrap().remove("updateTime");
        Mock::given(method("GET"))
            .and(path(DOC_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(doc))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let err = store(&server)
            .await
            .update("rec-1", RecordMutation::Fail { reason: "late".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(id) if id == "rec-1"));
    }

    #[tokio::test]
    async fn test_update_gives_up_after_repeated_conflicts() {
        let server = MockServer::start().await;
        let record = record();
        Mock::given(method("GET"))
            .and(path(DOC_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(document(&record, "2026-01-01T00:00:00Z")))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(412).set_body_string("FAILED_PRECONDITION"))
            .expect(MAX_CONFLICT_RETRIES as u64)
            .mount(&server)
            .await;

        let err = store(&server)
            .await
            .update("rec-1", RecordMutation::MarkProcessing)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
