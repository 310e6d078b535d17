//! Shared data models for the pre-flight campaign check.
//!
//! This crate provides Serde-serializable types for:
//! - Campaign context and its validation
//! - Creative metrics produced by the scene-cut heuristic
//! - Policy review results and the callback wire format
//! - The analysis record aggregate and its state machine

pub mod analysis;
pub mod callback;
pub mod campaign;
pub mod creative;
pub mod policy;

// Re-export common types
pub use analysis::{
    AnalysisRecord, AnalysisResults, AnalysisStatus, Rating, RecordMutation, Transition,
};
pub use callback::{CallbackStatus, PolicyCallback, PolicyResults};
pub use campaign::{CampaignContext, CampaignError, CampaignResult};
pub use creative::CreativeMetrics;
pub use policy::{PolicyResult, PolicyVerdict, ReviewFlagPolicy};
