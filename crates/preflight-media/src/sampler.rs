//! FFmpeg-backed frame sampler.
//!
//! Decodes `fps=1/interval,scale=N:N` raw RGB24 frames from a local file,
//! bounded by the sample cap, analysis window and a wall-clock timeout.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use image::RgbImage;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::scene_cut::{SampledFrame, SceneCutConfig};

/// Samples frames from a video file with FFmpeg.
#[derive(Debug, Clone, Default)]
pub struct FfmpegFrameSampler {
    config: SceneCutConfig,
}

impl FfmpegFrameSampler {
    pub fn new(config: SceneCutConfig) -> Self {
        Self { config }
    }

    /// FFmpeg arguments for sampling `input`.
    pub fn build_args(&self, input: &Path) -> Vec<String> {
        let side = self.config.resolution;
        let fps = 1.0 / self.config.sample_interval_secs.max(0.01);
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-t".to_string(),
            format!("{:.3}", self.config.max_window_secs),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-vf".to_string(),
            format!("fps={:.4},scale={}:{}", fps, side, side),
            "-frames:v".to_string(),
            self.config.max_samples.to_string(),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "rgb24".to_string(),
            "pipe:1".to_string(),
        ]
    }

    /// Decode sampled frames.
    ///
    /// Never fails as a whole: a spawn or decode failure ends the sequence
    /// with an `Err` item after the frames decoded so far.
    pub async fn sample(&self, input: impl AsRef<Path>) -> Vec<MediaResult<SampledFrame>> {
        let input = input.as_ref();
        let mut frames = Vec::new();

        if !input.exists() {
            frames.push(Err(MediaError::FileNotFound(input.to_path_buf())));
            return frames;
        }
        if which::which("ffmpeg").is_err() {
            frames.push(Err(MediaError::FfmpegNotFound));
            return frames;
        }

        let args = self.build_args(input);
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = match Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                frames.push(Err(MediaError::Io(e)));
                return frames;
            }
        };

        let Some(mut stdout) = child.stdout.take() else {
            frames.push(Err(MediaError::ffmpeg_failed("stdout not captured", None, None)));
            return frames;
        };

        let timeout_secs = self.config.decode_timeout_secs;
        let deadline = Instant::now() + Duration::from_secs(timeout_secs);
        let side = self.config.resolution;
        let mut buffer = vec![0u8; self.config.frame_bytes()];

        while frames.len() < self.config.max_samples {
            match tokio::time::timeout_at(deadline, stdout.read_exact(&mut buffer)).await {
                Err(_) => {
                    warn!("Frame sampling timed out after {} seconds, killing FFmpeg", timeout_secs);
                    let _ = child.kill().await;
                    frames.push(Err(MediaError::Timeout(timeout_secs)));
                    return frames;
                }
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Ok(Err(e)) => {
                    frames.push(Err(MediaError::Io(e)));
                    return frames;
                }
                Ok(Ok(_)) => {
                    let timestamp = frames.len() as f64 * self.config.sample_interval_secs;
                    match RgbImage::from_raw(side, side, buffer.clone()) {
                        Some(image) => frames.push(Ok(SampledFrame::new(timestamp, image))),
                        None => {
                            frames.push(Err(MediaError::frame_decode("raw frame size mismatch")));
                            return frames;
                        }
                    }
                }
            }
        }

        // Enough frames read; stop decoding early.
        if frames.len() >= self.config.max_samples {
            let _ = child.kill().await;
            return frames;
        }

        match tokio::time::timeout_at(deadline, child.wait()).await {
            Ok(Ok(status)) if !status.success() && frames.is_empty() => {
                frames.push(Err(MediaError::ffmpeg_failed(
                    "FFmpeg exited with non-zero status",
                    None,
                    status.code(),
                )));
            }
            Ok(Ok(_)) => {}
            Ok(Err(e)) => frames.push(Err(MediaError::Io(e))),
            Err(_) => {
                let _ = child.kill().await;
            }
        }

        debug!(frames = frames.len(), "Frame sampling finished");
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args() {
        let sampler = FfmpegFrameSampler::default();
        let args = sampler.build_args(Path::new("/tmp/ad.mp4"));
        assert!(args.contains(&"fps=2.0000,scale=64:64".to_string()));
        assert!(args.contains(&"30.000".to_string()));
        assert!(args.contains(&"60".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
    }

    #[tokio::test]
    async fn test_missing_file_yields_single_error() {
        let sampler = FfmpegFrameSampler::default();
        let frames = sampler.sample("/definitely/not/here.mp4").await;
        assert_eq!(frames.len(), 1);
        assert!(matches!(frames[0], Err(MediaError::FileNotFound(_))));
    }
}
