//! Orchestration metrics.

use std::time::Duration;

use metrics::{counter, histogram};

pub mod names {
    /// Submitted analyses by outcome (completed, accepted, rejected, error).
    pub const ANALYSES_SUBMITTED_TOTAL: &str = "preflight_analyses_submitted_total";

    /// Workflow callbacks by outcome (updated, acknowledged, already_final, error).
    pub const CALLBACKS_TOTAL: &str = "preflight_policy_callbacks_total";

    /// Hybrid trigger round-trip in seconds, including replies after the soft timeout.
    pub const TRIGGER_LATENCY_SECONDS: &str = "preflight_review_trigger_latency_seconds";
}

pub fn record_submission(outcome: &'static str) {
    counter!(names::ANALYSES_SUBMITTED_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_callback(outcome: &'static str) {
    counter!(names::CALLBACKS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_trigger_latency(outcome: &'static str, elapsed: Duration) {
    histogram!(names::TRIGGER_LATENCY_SECONDS, "outcome" => outcome).record(elapsed.as_secs_f64());
}
