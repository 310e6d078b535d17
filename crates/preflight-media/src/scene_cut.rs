//! Scene cut detection for creative pacing analysis.
//!
//! Detects shot boundaries using color histogram comparison.
//!
//! # Algorithm
//! 1. Downsample each sampled frame to `resolution x resolution`
//! 2. Compute a per-channel RGB histogram (`bins_per_channel` bins each)
//! 3. Compare consecutive histograms by L1 distance
//! 4. Emit a cut at the later frame when the distance exceeds
//!    `threshold_ratio * max_distance`
//!
//! # Usage
//! ```rust,ignore
//! use preflight_media::{SceneCutDetector, SceneCutConfig};
//!
//! let detector = SceneCutDetector::new(SceneCutConfig::default());
//! let cuts = detector.detect(frames);
//! ```

use image::imageops::{self, FilterType};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::MediaResult;

/// Sampling and detection policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneCutConfig {
    /// Square side frames are downsampled to before histogramming
    pub resolution: u32,
    /// Number of histogram bins per channel
    pub bins_per_channel: u32,
    /// Fraction of the maximum L1 distance above which a cut is declared
    pub threshold_ratio: f64,
    /// Seconds between sampled frames
    pub sample_interval_secs: f64,
    /// Hard cap on sampled frames
    pub max_samples: usize,
    /// Only the first `max_window_secs` of the video are analysed
    pub max_window_secs: f64,
    /// Wall-clock limit on frame decoding
    pub decode_timeout_secs: u64,
}

impl Default for SceneCutConfig {
    fn default() -> Self {
        Self {
            resolution: 64,
            bins_per_channel: 16,
            threshold_ratio: 0.15,
            sample_interval_secs: 0.5,
            max_samples: 60,
            max_window_secs: 30.0,
            decode_timeout_secs: 20,
        }
    }
}

impl SceneCutConfig {
    /// Largest possible L1 distance between two histograms.
    pub fn max_distance(&self) -> f64 {
        2.0 * self.resolution as f64 * self.resolution as f64 * 3.0
    }

    /// Distance above which consecutive frames are a cut.
    pub fn cut_threshold(&self) -> f64 {
        self.threshold_ratio * self.max_distance()
    }

    /// Bytes in one raw RGB24 frame at the configured resolution.
    pub fn frame_bytes(&self) -> usize {
        (self.resolution * self.resolution * 3) as usize
    }
}

/// A decoded frame at a position in the video.
#[derive(Debug, Clone)]
pub struct SampledFrame {
    /// Seconds from the start of the video
    pub timestamp: f64,
    pub image: RgbImage,
}

impl SampledFrame {
    pub fn new(timestamp: f64, image: RgbImage) -> Self {
        Self { timestamp, image }
    }
}

/// Concatenated R, G and B histograms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorHistogram {
    bins: Vec<u32>,
}

impl ColorHistogram {
    pub fn bins(&self) -> &[u32] {
        &self.bins
    }

    /// Sum of absolute bin differences.
    pub fn l1_distance(&self, other: &ColorHistogram) -> u64 {
        self.bins
            .iter()
            .zip(other.bins.iter())
            .map(|(a, b)| a.abs_diff(*b) as u64)
            .sum()
    }
}

/// Scene cut detector using histogram comparison. Deterministic.
#[derive(Debug, Clone, Default)]
pub struct SceneCutDetector {
    config: SceneCutConfig,
}

impl SceneCutDetector {
    pub fn new(config: SceneCutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SceneCutConfig {
        &self.config
    }

    /// Compute the color histogram of a frame after downsampling.
    pub fn histogram(&self, image: &RgbImage) -> ColorHistogram {
        let side = self.config.resolution;
        let bins = self.config.bins_per_channel.max(1) as usize;

        let resized;
        let frame = if image.width() == side && image.height() == side {
            image
        } else {
            resized = imageops::resize(image, side, side, FilterType::Triangle);
            &resized
        };

        let mut histogram = vec![0u32; bins * 3];
        for pixel in frame.pixels() {
            for (channel, value) in pixel.0.iter().enumerate() {
                let bin = (*value as usize * bins) / 256;
                histogram[channel * bins + bin] += 1;
            }
        }

        ColorHistogram { bins: histogram }
    }

    /// Detect cuts over an ordered frame sequence.
    ///
    /// Returns ascending cut timestamps. Stops at the first decode error,
    /// the sample cap or the analysis window, keeping the cuts found so far.
    pub fn detect<I>(&self, frames: I) -> Vec<f64>
    where
        I: IntoIterator<Item = MediaResult<SampledFrame>>,
    {
        let threshold = self.config.cut_threshold();
        let mut cuts = Vec::new();
        let mut previous: Option<(f64, ColorHistogram)> = None;

        for (index, frame) in frames.into_iter().enumerate() {
            if index >= self.config.max_samples {
                debug!(max_samples = self.config.max_samples, "Sample cap reached");
                break;
            }

            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(error = %e, cuts = cuts.len(), "Frame decoding failed, keeping cuts so far");
                    break;
                }
            };

            if frame.timestamp >= self.config.max_window_secs {
                break;
            }
            if frame.image.width() == 0 || frame.image.height() == 0 {
                warn!(timestamp = frame.timestamp, "Empty frame, keeping cuts so far");
                break;
            }
            if let Some((previous_ts, _)) = &previous {
                if frame.timestamp <= *previous_ts {
                    debug!(timestamp = frame.timestamp, "Skipping out-of-order frame");
                    continue;
                }
            }

            let histogram = self.histogram(&frame.image);
            if let Some((_, previous_histogram)) = &previous {
                let distance = previous_histogram.l1_distance(&histogram) as f64;
                if distance > threshold {
                    debug!(
                        timestamp = frame.timestamp,
                        distance,
                        threshold,
                        "Scene cut detected"
                    );
                    cuts.push(frame.timestamp);
                }
            }
            previous = Some((frame.timestamp, histogram));
        }

        cuts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaError;
    use image::Rgb;

    fn solid(ts: f64, rgb: [u8; 3]) -> MediaResult<SampledFrame> {
        Ok(SampledFrame::new(ts, RgbImage::from_pixel(64, 64, Rgb(rgb))))
    }

    #[test]
    fn test_thresholds() {
        let config = SceneCutConfig::default();
        assert_eq!(config.max_distance(), 24576.0);
        assert!((config.cut_threshold() - 3686.4).abs() < 1e-9);
        assert_eq!(config.frame_bytes(), 12288);
    }

    #[test]
    fn test_histogram_shape() {
        let detector = SceneCutDetector::default();
        let histogram = detector.histogram(&RgbImage::from_pixel(64, 64, Rgb([0, 128, 255])));
        assert_eq!(histogram.bins().len(), 48);
        assert_eq!(histogram.bins()[0], 4096);
        assert_eq!(histogram.bins()[16 + 8], 4096);
        assert_eq!(histogram.bins()[32 + 15], 4096);
        assert_eq!(histogram.bins().iter().map(|b| *b as u64).sum::<u64>(), 3 * 4096);
    }

    #[test]
    fn test_histogram_downsamples_larger_frames() {
        let detector = SceneCutDetector::default();
        let small = detector.histogram(&RgbImage::from_pixel(64, 64, Rgb([10, 200, 30])));
        let large = detector.histogram(&RgbImage::from_pixel(320, 180, Rgb([10, 200, 30])));
        assert_eq!(small, large);
    }

    #[test]
    fn test_detects_hard_cuts() {
        let detector = SceneCutDetector::default();
        let frames = vec![
            solid(0.0, [0, 0, 0]),
            solid(0.5, [0, 0, 0]),
            solid(1.0, [255, 255, 255]),
            solid(1.5, [255, 255, 255]),
            solid(2.0, [200, 0, 0]),
        ];
        assert_eq!(detector.detect(frames), vec![1.0, 2.0]);
    }

    #[test]
    fn test_small_changes_are_not_cuts() {
        let detector = SceneCutDetector::default();
        let mut nudged = RgbImage::from_pixel(64, 64, Rgb([0, 0, 0]));
        for x in 0..8 {
            nudged.put_pixel(x, 0, Rgb([255, 255, 255]));
        }
        let frames = vec![solid(0.0, [0, 0, 0]), Ok(SampledFrame::new(0.5, nudged))];
        assert!(detector.detect(frames).is_empty());
    }

    #[test]
    fn test_decode_failure_keeps_cuts_so_far() {
        let detector = SceneCutDetector::default();
        let frames = vec![
            solid(0.0, [0, 0, 0]),
            solid(0.5, [255, 255, 255]),
            Err(MediaError::frame_decode("truncated")),
            solid(1.5, [0, 0, 0]),
        ];
        assert_eq!(detector.detect(frames), vec![0.5]);

        let failed_first = vec![Err(MediaError::frame_decode("boom"))];
        assert!(detector.detect(failed_first).is_empty());
    }

    #[test]
    fn test_respects_window_and_sample_cap() {
        let detector = SceneCutDetector::new(SceneCutConfig {
            max_samples: 4,
            ..Default::default()
        });
        let frames = (0..10).map(|i| {
            let color = if i % 2 == 0 { [0, 0, 0] } else { [255, 255, 255] };
            solid(i as f64 * 0.5, color)
        });
        assert_eq!(detector.detect(frames), vec![0.5, 1.0, 1.5]);

        let detector = SceneCutDetector::default();
        let frames = vec![solid(29.5, [0, 0, 0]), solid(30.0, [255, 255, 255])];
        assert!(detector.detect(frames).is_empty());
    }

    #[test]
    fn test_deterministic() {
        let detector = SceneCutDetector::default();
        let make = || {
            (0..20).map(|i| {
                let v = ((i * 37) % 256) as u8;
                solid(i as f64 * 0.5, [v, 255 - v, v / 2])
            })
        };
        assert_eq!(detector.detect(make()), detector.detect(make()));
    }
}
