//! Creative video analysis.
//!
//! This crate provides:
//! - Histogram-based scene cut detection over sampled frames
//! - An FFmpeg-backed frame sampler for local files
//! - FFprobe metadata extraction
//! - [`analyze_video_file`], which ties them to the creative metrics calculator

pub mod analysis;
pub mod error;
pub mod probe;
pub mod sampler;
pub mod scene_cut;

pub use analysis::{analyze_video_file, CreativeReport, MAX_VALID_DURATION_SECS, MIN_VALID_DURATION_SECS};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_video, VideoInfo};
pub use sampler::FfmpegFrameSampler;
pub use scene_cut::{ColorHistogram, SampledFrame, SceneCutConfig, SceneCutDetector};
