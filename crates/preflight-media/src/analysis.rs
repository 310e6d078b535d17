//! Local creative analysis of a video file.

use std::path::Path;

use preflight_models::CreativeMetrics;
use preflight_scoring::{CreativeAssessment, CreativeMetricsCalculator};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::MediaResult;
use crate::probe::probe_video;
use crate::sampler::FfmpegFrameSampler;
use crate::scene_cut::{SceneCutConfig, SceneCutDetector};

/// Shortest duration considered valid for a short-form creative.
pub const MIN_VALID_DURATION_SECS: f64 = 15.0;
/// Longest duration considered valid for a short-form creative.
pub const MAX_VALID_DURATION_SECS: f64 = 45.0;

/// Creative metrics plus the detection details behind them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativeReport {
    pub metrics: CreativeMetrics,
    pub cuts: Vec<f64>,
    pub scene_count: usize,
    pub pacing_rate: f64,
    pub duration_valid: bool,
}

impl CreativeReport {
    pub fn new(assessment: CreativeAssessment, cuts: Vec<f64>) -> Self {
        let duration = assessment.metrics.duration_seconds;
        Self {
            metrics: assessment.metrics,
            cuts,
            scene_count: assessment.scene_count,
            pacing_rate: assessment.pacing_rate,
            duration_valid: (MIN_VALID_DURATION_SECS..=MAX_VALID_DURATION_SECS).contains(&duration),
        }
    }
}

/// Probe, sample and score a local video file.
///
/// Probe failures are returned; frame decoding failures only shorten the
/// cut list.
pub async fn analyze_video_file(path: impl AsRef<Path>, config: &SceneCutConfig) -> MediaResult<CreativeReport> {
    let path = path.as_ref();
    let info = probe_video(path).await?;

    let frames = FfmpegFrameSampler::new(config.clone()).sample(path).await;
    let cuts = SceneCutDetector::new(config.clone()).detect(frames);

    let assessment = CreativeMetricsCalculator::new().calculate(info.duration, &cuts, info.dimensions());
    let report = CreativeReport::new(assessment, cuts);

    info!(
        path = %path.display(),
        duration = info.duration,
        cuts = report.cuts.len(),
        pacing_rate = report.pacing_rate,
        hook_score = report.metrics.hook_score,
        pacing_score = report.metrics.pacing_score,
        "Creative analysis complete"
    );

    Ok(report)
}
