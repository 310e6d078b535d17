//! Where an analysis gets its creative metrics from.

use std::path::PathBuf;

use preflight_media::{analyze_video_file, SceneCutConfig};
use preflight_models::CreativeMetrics;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum CreativeSource {
    /// Metrics computed by the client-side heuristic
    ClientSupplied(CreativeMetrics),
    /// Local video file analysed with FFmpeg
    LocalFile(PathBuf),
    /// No creative analysis; metrics are zeroed
    Skipped,
}

impl CreativeSource {
    /// Resolve to metrics. Never fails: an unreadable file yields zeroed metrics.
    pub async fn resolve(&self, scene_cut: &SceneCutConfig) -> CreativeMetrics {
        match self {
            CreativeSource::ClientSupplied(metrics) => metrics.sanitized(),
            CreativeSource::LocalFile(path) => match analyze_video_file(path, scene_cut).await {
                Ok(report) => {
                    if !report.duration_valid {
                        info!(
                            path = %path.display(),
                            duration = report.metrics.duration_seconds,
                            "Creative duration outside the recommended range"
                        );
                    }
                    report.metrics
                }
                Err(e) => {
                    warn!(path = %path.display(), "Creative analysis failed, using zeroed metrics: {}", e);
                    CreativeMetrics::default()
                }
            },
            CreativeSource::Skipped => CreativeMetrics::default(),
        }
    }
}

impl From<Option<CreativeMetrics>> for CreativeSource {
    fn from(metrics: Option<CreativeMetrics>) -> Self {
        match metrics {
            Some(metrics) => CreativeSource::ClientSupplied(metrics),
            None => CreativeSource::Skipped,
        }
    }
}
