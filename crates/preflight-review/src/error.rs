//! Review client error types.

use thiserror::Error;

pub type ReviewResult<T> = Result<T, ReviewError>;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Review workflow unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Review workflow returned {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReviewError {
    pub fn request_failed(status: u16, body: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            body: body.into(),
        }
    }

    /// Only failures that never reached the workflow are retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReviewError::ServiceUnavailable(_) => true,
            ReviewError::Network(e) => e.is_connect(),
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ReviewError::Network(e) if e.is_timeout())
    }
}
