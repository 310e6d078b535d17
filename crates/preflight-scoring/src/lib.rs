//! Deterministic scoring for pre-flight campaign checks.
//!
//! Every function here is pure:
//! - [`benchmark`]: target CPA against industry averages
//! - [`creative`]: pacing, hook and safe-zone metrics from scene cuts
//! - [`predictive`]: DNA score, predictive score and final rating

pub mod benchmark;
pub mod creative;
pub mod predictive;

pub use benchmark::{BenchmarkTable, DEFAULT_INDUSTRY_CPA};
pub use creative::{CreativeAssessment, CreativeMetricsCalculator};
pub use predictive::{classify, dna_score, predictive_score, round2, ScoringEngine};
