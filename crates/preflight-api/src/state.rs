//! Application state.

use std::sync::Arc;

use preflight_orchestrator::{PolicyOrchestrator, PreflightConfig};
use preflight_store::{AnalysisRecordStore, FirestoreClient, FirestoreRecordStore, InMemoryRecordStore};
use tracing::info;

use crate::config::{ApiConfig, StoreBackend};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: PolicyOrchestrator,
}

impl AppState {
    pub fn new(config: ApiConfig, orchestrator: PolicyOrchestrator) -> Self {
        Self { config, orchestrator }
    }

    /// Build the record store and orchestrator from configuration.
    pub async fn from_config(
        config: ApiConfig,
        preflight: PreflightConfig,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let store: Arc<dyn AnalysisRecordStore> = match config.store_backend {
            StoreBackend::Memory => Arc::new(InMemoryRecordStore::new()),
            StoreBackend::Firestore => Arc::new(FirestoreRecordStore::new(FirestoreClient::from_env().await?)),
        };
        info!(backend = store.backend(), mode = ?preflight.review_mode, "Record store ready");

        let orchestrator = PolicyOrchestrator::new(preflight, store)?;
        Ok(Self::new(config, orchestrator))
    }
}
