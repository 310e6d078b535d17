//! Axum HTTP API for pre-flight campaign checks.
//!
//! This crate provides:
//! - `POST /api/analyze` and `GET /api/analyze/:id/status`
//! - `POST /api/webhook/policy-result` for review workflow callbacks
//! - Health and Prometheus metrics endpoints

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{ApiConfig, StoreBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
