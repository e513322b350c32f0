//! Combine one video stream and one audio stream into a single file.
//!
//! The trim policy is "shortest wins": the output ends when the shorter input
//! ends. Nothing is padded, stretched or cross-faded. The video stream is
//! copied as-is; only the audio stream is transcoded.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use metrics::histogram;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::remove_if_exists;
use crate::probe::probe_media;

/// Histogram of successful mux wall-clock time.
pub const MUX_DURATION_METRIC: &str = "avgen_mux_duration_seconds";

/// Which input gets cut short by the mux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrimmedInput {
    Video,
    Audio,
    /// Both inputs have the same length
    Neither,
}

/// Duration reconciliation for a pair of inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MuxPlan {
    pub video_duration: f64,
    pub audio_duration: f64,
}

impl MuxPlan {
    pub fn new(video_duration: f64, audio_duration: f64) -> Self {
        Self {
            video_duration,
            audio_duration,
        }
    }

    /// Length of the muxed output: the shorter of the two inputs.
    pub fn output_duration(&self) -> f64 {
        self.video_duration.min(self.audio_duration)
    }

    pub fn trimmed(&self) -> TrimmedInput {
        if self.video_duration > self.audio_duration {
            TrimmedInput::Video
        } else if self.audio_duration > self.video_duration {
            TrimmedInput::Audio
        } else {
            TrimmedInput::Neither
        }
    }
}

/// Result of a successful mux.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuxOutput {
    pub path: PathBuf,
    pub plan: MuxPlan,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Something that can combine a video file and an audio file.
#[async_trait]
pub trait Combiner: Send + Sync {
    async fn combine(&self, video: &Path, audio: &Path, output: &Path) -> MediaResult<MuxOutput>;
}

/// Muxer settings.
#[derive(Debug, Clone)]
pub struct MuxerConfig {
    /// Kill FFmpeg after this long
    pub timeout: Duration,
    /// Codec for the audio stream
    pub audio_codec: String,
    /// Optional audio bitrate (e.g. "192k")
    pub audio_bitrate: Option<String>,
}

impl Default for MuxerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            audio_codec: "aac".to_string(),
            audio_bitrate: None,
        }
    }
}

/// FFmpeg-backed [`Combiner`].
#[derive(Debug, Clone, Default)]
pub struct FfmpegMuxer {
    config: MuxerConfig,
}

impl FfmpegMuxer {
    pub fn new(config: MuxerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MuxerConfig {
        &self.config
    }

    /// Build the FFmpeg invocation for a planned mux.
    pub fn build_command(&self, video: &Path, audio: &Path, output: &Path, plan: &MuxPlan) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new(output)
            .input(video)
            .input(audio)
            .map("0:v:0")
            .map("1:a:0")
            .video_codec("copy")
            .audio_codec(self.config.audio_codec.clone());

        if let Some(bitrate) = &self.config.audio_bitrate {
            cmd = cmd.audio_bitrate(bitrate.clone());
        }

        cmd.shortest().max_duration(plan.output_duration())
    }
}

#[async_trait]
impl Combiner for FfmpegMuxer {
    async fn combine(&self, video: &Path, audio: &Path, output: &Path) -> MediaResult<MuxOutput> {
        let start = Instant::now();

        let (video_info, audio_info) = tokio::join!(probe_media(video), probe_media(audio));
        let (video_info, audio_info) = (video_info?, audio_info?);

        if !video_info.has_video() {
            return Err(MediaError::invalid_media(format!(
                "{} has no video stream",
                video.display()
            )));
        }
        if !audio_info.has_audio() {
            return Err(MediaError::invalid_media(format!(
                "{} has no audio stream",
                audio.display()
            )));
        }

        let plan = MuxPlan::new(video_info.duration, audio_info.duration);
        info!(
            video_duration = plan.video_duration,
            audio_duration = plan.audio_duration,
            output_duration = plan.output_duration(),
            trimmed = ?plan.trimmed(),
            "Muxing video and audio"
        );

        let cmd = self.build_command(video, audio, output, &plan);
        let total_ms = (plan.output_duration() * 1000.0) as i64;
        let runner = FfmpegRunner::new().with_timeout(self.config.timeout);

        let result = runner
            .run_with_progress(&cmd, move |progress| {
                debug!("Mux progress: {:.0}%", progress.percentage(total_ms));
            })
            .await;

        if let Err(e) = result {
            warn!("Mux failed, discarding partial output: {}", e.detail());
            if let Err(cleanup) = remove_if_exists(output).await {
                warn!("Failed to remove partial mux output {}: {}", output.display(), cleanup);
            }
            return Err(e);
        }

        let elapsed = start.elapsed();
        histogram!(MUX_DURATION_METRIC).record(elapsed.as_secs_f64());
        info!("Muxed {} in {:.1}s", output.display(), elapsed.as_secs_f64());

        Ok(MuxOutput {
            path: output.to_path_buf(),
            plan,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_duration_is_shorter_input() {
        let plan = MuxPlan::new(5.2, 7.8);
        assert!((plan.output_duration() - 5.2).abs() < 1e-9);
        assert_eq!(plan.trimmed(), TrimmedInput::Audio);

        let plan = MuxPlan::new(7.8, 5.2);
        assert!((plan.output_duration() - 5.2).abs() < 1e-9);
        assert_eq!(plan.trimmed(), TrimmedInput::Video);

        assert_eq!(MuxPlan::new(3.5, 3.5).trimmed(), TrimmedInput::Neither);
    }

    #[test]
    fn test_mux_command_copies_video_and_transcodes_audio() {
        let muxer = FfmpegMuxer::default();
        let plan = MuxPlan::new(7.8, 5.2);
        let args = muxer
            .build_command(Path::new("v.mp4"), Path::new("a.mp3"), Path::new("out.mp4"), &plan)
            .build_args();

        let joined = args.join(" ");
        assert!(joined.contains("-i v.mp4 -i a.mp3"));
        assert!(joined.contains("-map 0:v:0 -map 1:a:0"));
        assert!(joined.contains("-c:v copy"));
        assert!(joined.contains("-c:a aac"));
        assert!(joined.contains("-shortest"));
        assert!(joined.contains("-t 5.200"));
        assert!(joined.ends_with("out.mp4"));
    }

    #[test]
    fn test_mux_command_with_bitrate() {
        let muxer = FfmpegMuxer::new(MuxerConfig {
            audio_bitrate: Some("192k".to_string()),
            ..Default::default()
        });
        let args = muxer
            .build_command(Path::new("v.mp4"), Path::new("a.mp3"), Path::new("o.mp4"), &MuxPlan::new(1.0, 2.0))
            .build_args();
        assert!(args.join(" ").contains("-b:a 192k"));
    }

    #[tokio::test]
    async fn test_missing_input_fails_before_running_ffmpeg() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("final.mp4");

        let result = FfmpegMuxer::default()
            .combine(&dir.path().join("video.mp4"), &dir.path().join("audio.mp3"), &output)
            .await;

        tokio_test::assert_err!(&result);
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
        assert!(!output.exists());
    }
}
