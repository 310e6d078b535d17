//! Creative metrics from scene cuts.

use preflight_models::CreativeMetrics;
use serde::{Deserialize, Serialize};

/// Hook score without an early cut.
pub const HOOK_BASE: f64 = 30.0;
/// Bonus for a cut inside the hook window.
pub const HOOK_EARLY_CUT_BONUS: f64 = 40.0;
/// Cuts at or before this timestamp count as a hook.
pub const HOOK_WINDOW_SECS: f64 = 3.0;

/// Pacing score for an average scene length (seconds per scene).
pub fn pacing_score(pacing_rate: f64) -> f64 {
    if pacing_rate < 1.5 {
        80.0
    } else if pacing_rate <= 2.5 {
        100.0
    } else if pacing_rate <= 4.0 {
        (100.0 - 40.0 * (pacing_rate - 2.5)).max(40.0)
    } else {
        40.0
    }
}

/// Hook score: base plus a bonus when any cut lands in the first seconds.
pub fn hook_score(cuts: &[f64]) -> f64 {
    let mut score = HOOK_BASE;
    if cuts.iter().any(|&t| t <= HOOK_WINDOW_SECS) {
        score += HOOK_EARLY_CUT_BONUS;
    }
    score.min(100.0)
}

/// Portrait framing check, `0.4 < w/h < 0.7`. Unknown dimensions are not safe.
pub fn is_safe_zone(dimensions: Option<(u32, u32)>) -> bool {
    match dimensions {
        Some((width, height)) if width > 0 && height > 0 => {
            let ratio = width as f64 / height as f64;
            ratio > 0.4 && ratio < 0.7
        }
        _ => false,
    }
}

/// Metrics plus the intermediate values they were derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativeAssessment {
    pub metrics: CreativeMetrics,
    pub scene_count: usize,
    /// Seconds per scene
    pub pacing_rate: f64,
}

/// Converts cuts and duration into [`CreativeMetrics`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CreativeMetricsCalculator;

impl CreativeMetricsCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Compute metrics for a video.
    ///
    /// A non-positive or non-finite duration yields zeroed metrics.
    pub fn calculate(&self, duration: f64, cuts: &[f64], dimensions: Option<(u32, u32)>) -> CreativeAssessment {
        let scene_count = cuts.len() + 1;

        if !(duration.is_finite() && duration > 0.0) {
            return CreativeAssessment {
                metrics: CreativeMetrics::default(),
                scene_count,
                pacing_rate: 0.0,
            };
        }

        let pacing_rate = duration / scene_count as f64;
        CreativeAssessment {
            metrics: CreativeMetrics {
                hook_score: hook_score(cuts),
                pacing_score: pacing_score(pacing_rate),
                safe_zone: is_safe_zone(dimensions),
                duration_seconds: duration,
            },
            scene_count,
            pacing_rate,
        }
    }
}
