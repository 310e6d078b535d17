//! Pre-flight analysis orchestration.
//!
//! This crate provides:
//! - [`PolicyOrchestrator`]: record creation, provisional scoring and the
//!   hybrid trigger race (or direct fan-out review)
//! - [`CallbackHandler`]: the terminal-guarded writer for workflow callbacks
//! - [`PreflightConfig`]: layered file + environment configuration

pub mod callback;
pub mod config;
pub mod creative;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;

pub use callback::{CallbackHandler, CallbackOutcome};
pub use config::{PreflightConfig, ReviewMode};
pub use creative::CreativeSource;
pub use error::{OrchestratorError, OrchestratorResult};
pub use logging::AnalysisLogger;
pub use orchestrator::{PolicyOrchestrator, StatusView, SubmitOutcome};
