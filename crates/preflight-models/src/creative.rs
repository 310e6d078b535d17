//! Creative video metrics.

use serde::{Deserialize, Serialize};

/// Heuristic quality metrics for a creative video.
///
/// Scores are kept at full precision; use [`CreativeMetrics::rounded`] for
/// display. A skipped analysis produces the zeroed default.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CreativeMetrics {
    /// Hook strength (0-100)
    #[serde(default, alias = "hook")]
    pub hook_score: f64,
    /// Pacing quality (0-100)
    #[serde(default, alias = "pacing")]
    pub pacing_score: f64,
    /// Whether framing matches the portrait safe zone
    #[serde(default)]
    pub safe_zone: bool,
    /// Video duration in seconds
    #[serde(default, alias = "duration")]
    pub duration_seconds: f64,
}

impl CreativeMetrics {
    pub fn new(hook_score: f64, pacing_score: f64, safe_zone: bool, duration_seconds: f64) -> Self {
        Self {
            hook_score,
            pacing_score,
            safe_zone,
            duration_seconds,
        }
    }

    /// Scores rounded to the nearest integer.
    pub fn rounded(&self) -> Self {
        Self {
            hook_score: self.hook_score.round(),
            pacing_score: self.pacing_score.round(),
            ..*self
        }
    }

    /// Clamp scores into 0-100 and duration to non-negative.
    ///
    /// Client-supplied metrics pass through here before they are stored.
    pub fn sanitized(&self) -> Self {
        Self {
            hook_score: clamp_score(self.hook_score),
            pacing_score: clamp_score(self.pacing_score),
            safe_zone: self.safe_zone,
            duration_seconds: if self.duration_seconds.is_finite() {
                self.duration_seconds.max(0.0)
            } else {
                0.0
            },
        }
    }

    pub fn is_zeroed(&self) -> bool {
        *self == Self::default()
    }
}

fn clamp_score(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounded_keeps_other_fields() {
        let metrics = CreativeMetrics::new(69.6, 93.33, true, 12.4);
        let rounded = metrics.rounded();
        assert_eq!(rounded.hook_score, 70.0);
        assert_eq!(rounded.pacing_score, 93.0);
        assert!(rounded.safe_zone);
        assert_eq!(rounded.duration_seconds, 12.4);
    }

    #[test]
    fn test_sanitized_clamps() {
        let metrics = CreativeMetrics::new(140.0, -3.0, false, f64::INFINITY).sanitized();
        assert_eq!(metrics.hook_score, 100.0);
        assert_eq!(metrics.pacing_score, 0.0);
        assert_eq!(metrics.duration_seconds, 0.0);
    }

    #[test]
    fn test_deserialize_short_names() {
        let metrics: CreativeMetrics =
            serde_json::from_str(r#"{"hook":70,"pacing":100,"safe_zone":true,"duration":20}"#).unwrap();
        assert_eq!(metrics, CreativeMetrics::new(70.0, 100.0, true, 20.0));
    }

    #[test]
    fn test_default_is_zeroed() {
        assert!(CreativeMetrics::default().is_zeroed());
        let empty: CreativeMetrics = serde_json::from_str("{}").unwrap();
        assert!(empty.is_zeroed());
    }
}
