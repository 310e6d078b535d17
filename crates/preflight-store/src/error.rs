//! Record store error types.

use thiserror::Error;

use crate::firestore::FirestoreError;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by any [`crate::AnalysisRecordStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Analysis record not found: {0}")]
    NotFound(String),

    #[error("Analysis record already exists: {0}")]
    AlreadyExists(String),

    #[error("Concurrent update conflict on {0}, retries exhausted")]
    Conflict(String),

    #[error("Record encoding error: {0}")]
    Encoding(String),

    #[error(transparent)]
    Firestore(#[from] FirestoreError),
}

impl StoreError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
