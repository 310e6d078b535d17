//! Orchestrator error types.

use preflight_models::CampaignError;
use preflight_review::ReviewError;
use preflight_store::StoreError;
use thiserror::Error;

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Rejected before any record was written
    #[error("Validation error: {0}")]
    Validation(#[from] CampaignError),

    /// The review workflow could not be reached or answered with an error status
    #[error("Policy review request failed: {0}")]
    Transport(#[from] ReviewError),

    #[error("Analysis not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OrchestratorError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, OrchestratorError::NotFound(_))
    }
}

impl From<StoreError> for OrchestratorError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_maps_to_not_found() {
        let err: OrchestratorError = StoreError::not_found("abc").into();
        assert!(err.is_not_found());

        let err: OrchestratorError = StoreError::Conflict("abc".into()).into();
        assert!(matches!(err, OrchestratorError::Store(_)));
    }
}
