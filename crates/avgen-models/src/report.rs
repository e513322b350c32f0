//! Run report emitted at the end of every orchestration run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::job::{JobFailure, JobKind, JobResult, ProviderMetadata};
use crate::outcome::{CombinationAction, CombinationOutcome};
use crate::run::RunId;
use crate::utils::{duration_secs, option_duration_secs};

/// Overall disposition of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Muxed artifact produced
    Succeeded,
    /// Video-only artifact produced; audio failed
    SucceededWithCaveat,
    /// No deliverable
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Succeeded => "succeeded",
            RunStatus::SucceededWithCaveat => "succeeded_with_caveat",
            RunStatus::Failed => "failed",
        }
    }
}

/// Per-task section of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    pub kind: JobKind,
    pub succeeded: bool,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ProviderMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<JobFailure>,
}

impl TaskReport {
    pub fn from_result(kind: JobKind, result: &JobResult) -> Self {
        let artifact = result.artifact();
        Self {
            kind,
            succeeded: result.is_success(),
            elapsed: result.elapsed(),
            artifact_path: artifact.map(|a| a.path.clone()),
            metadata: artifact.map(|a| a.metadata.clone()),
            failure: result.failure_info().cloned(),
        }
    }
}

/// Final report of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub video: TaskReport,
    pub audio: TaskReport,
    pub outcome: CombinationOutcome,
    pub action: CombinationAction,
    pub status: RunStatus,
    /// Delivered artifact, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(default, with = "option_duration_secs", skip_serializing_if = "Option::is_none")]
    pub mux_elapsed: Option<Duration>,
    #[serde(with = "duration_secs")]
    pub total_elapsed: Duration,
    /// Failure of the final combine / pass-through step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    /// Start a report from the two joined task results.
    pub fn new(
        run_id: RunId,
        started_at: DateTime<Utc>,
        video: &JobResult,
        audio: &JobResult,
    ) -> Self {
        let outcome = CombinationOutcome::from_results(video.is_success(), audio.is_success());
        Self {
            run_id,
            started_at,
            finished_at: None,
            video: TaskReport::from_result(JobKind::Video, video),
            audio: TaskReport::from_result(JobKind::Audio, audio),
            outcome,
            action: outcome.action(),
            status: RunStatus::Failed,
            output_path: None,
            mux_elapsed: None,
            total_elapsed: Duration::ZERO,
            error: None,
        }
    }

    /// Record the delivered artifact.
    pub fn with_output(mut self, path: PathBuf, mux_elapsed: Option<Duration>) -> Self {
        self.output_path = Some(path);
        self.mux_elapsed = mux_elapsed;
        self
    }

    /// Record a failure of the final step.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Stamp the total time and settle the run status.
    pub fn finish(mut self, total_elapsed: Duration) -> Self {
        self.total_elapsed = total_elapsed;
        self.finished_at = Some(Utc::now());
        self.status = match (self.action, &self.output_path, &self.error) {
            (_, _, Some(_)) | (_, None, _) | (CombinationAction::Abort, _, _) => RunStatus::Failed,
            (CombinationAction::PassThrough, Some(_), None) => RunStatus::SucceededWithCaveat,
            (CombinationAction::Combine, Some(_), None) => RunStatus::Succeeded,
        };
        self
    }

    /// True when a deliverable was produced.
    pub fn is_success(&self) -> bool {
        self.status != RunStatus::Failed
    }

    /// Time saved compared to running the two jobs back to back.
    pub fn parallel_savings(&self) -> Duration {
        self.video.elapsed.min(self.audio.elapsed)
    }

    fn task(&self, kind: JobKind) -> &TaskReport {
        match kind {
            JobKind::Video => &self.video,
            JobKind::Audio => &self.audio,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run {} [{}]", self.run_id, self.status.as_str())?;
        for kind in [JobKind::Video, JobKind::Audio] {
            let task = self.task(kind);
            match &task.failure {
                None => writeln!(
                    f,
                    "  {:<6} ok      {:>7.1}s",
                    kind.as_str(),
                    task.elapsed.as_secs_f64()
                )?,
                Some(failure) => writeln!(
                    f,
                    "  {:<6} FAILED  {:>7.1}s  {}",
                    kind.as_str(),
                    task.elapsed.as_secs_f64(),
                    failure
                )?,
            }
        }
        if let Some(mux) = self.mux_elapsed {
            writeln!(f, "  mux           {:>7.1}s", mux.as_secs_f64())?;
        }
        writeln!(
            f,
            "  total         {:>7.1}s (saved ~{:.1}s by running in parallel)",
            self.total_elapsed.as_secs_f64(),
            self.parallel_savings().as_secs_f64()
        )?;
        writeln!(f, "  outcome: {} -> {}", self.outcome, self.action)?;
        if self.status == RunStatus::SucceededWithCaveat {
            writeln!(f, "  caveat: audio generation failed, delivering video without sound")?;
        }
        if let Some(error) = &self.error {
            writeln!(f, "  error: {}", error)?;
        }
        match &self.output_path {
            Some(path) => write!(f, "  output: {}", path.display()),
            None => write!(f, "  output: none"),
        }
    }
}

/// Report of a narration-only run: no video, no mux.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub audio: TaskReport,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(with = "duration_secs")]
    pub total_elapsed: Duration,
}

impl NarrationReport {
    pub fn new(run_id: RunId, started_at: DateTime<Utc>, audio: &JobResult, total_elapsed: Duration) -> Self {
        let audio = TaskReport::from_result(JobKind::Audio, audio);
        Self {
            run_id,
            started_at,
            finished_at: Utc::now(),
            status: if audio.succeeded {
                RunStatus::Succeeded
            } else {
                RunStatus::Failed
            },
            output_path: audio.artifact_path.clone(),
            audio,
            total_elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Succeeded
    }
}

impl fmt::Display for NarrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Narration run {} [{}]", self.run_id, self.status.as_str())?;
        match &self.audio.failure {
            None => writeln!(f, "  audio  ok      {:>7.1}s", self.audio.elapsed.as_secs_f64())?,
            Some(failure) => writeln!(
                f,
                "  audio  FAILED  {:>7.1}s  {}",
                self.audio.elapsed.as_secs_f64(),
                failure
            )?,
        }
        match &self.output_path {
            Some(path) => write!(f, "  output: {}", path.display()),
            None => write!(f, "  output: none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{FailureKind, JobArtifact};

    fn video_ok(secs: u64) -> JobResult {
        JobResult::success(
            JobArtifact {
                path: PathBuf::from("/work/video.mp4"),
                size_bytes: 1024,
                metadata: ProviderMetadata::Video {
                    seed: Some(7),
                    duration_seconds: Some(3.5),
                    width: Some(848),
                    height: Some(480),
                    fps: Some(24),
                    num_frames: Some(84),
                    generation_time_seconds: Some(secs as f64),
                },
            },
            Duration::from_secs(secs),
        )
    }

    fn audio_failed(secs: u64) -> JobResult {
        JobResult::failure(
            JobFailure::new(FailureKind::Provider, "submit rejected: 401"),
            Duration::from_secs(secs),
        )
    }

    #[test]
    fn test_pass_through_is_success_with_caveat() {
        let report = RunReport::new(RunId::new(), Utc::now(), &video_ok(40), &audio_failed(1))
            .with_output(PathBuf::from("/work/final_video_only.mp4"), None)
            .finish(Duration::from_secs(40));

        assert_eq!(report.outcome, CombinationOutcome::VideoOnlySucceeded);
        assert_eq!(report.action, CombinationAction::PassThrough);
        assert_eq!(report.status, RunStatus::SucceededWithCaveat);
        assert!(report.is_success());

        let text = report.to_string();
        assert!(text.contains("audio  FAILED"));
        assert!(text.contains("caveat"));
        assert!(text.contains("final_video_only.mp4"));
    }

    #[test]
    fn test_combine_with_error_is_failed() {
        let audio = JobResult::success(
            JobArtifact {
                path: PathBuf::from("/work/audio.mp3"),
                size_bytes: 64,
                metadata: ProviderMetadata::Narration {
                    request_id: "r".into(),
                    audio_url: "https://cdn/a.mp3".into(),
                },
            },
            Duration::from_secs(15),
        );
        let report = RunReport::new(RunId::new(), Utc::now(), &video_ok(40), &audio)
            .with_error("FFmpeg command failed")
            .finish(Duration::from_secs(41));

        assert_eq!(report.action, CombinationAction::Combine);
        assert_eq!(report.status, RunStatus::Failed);
        assert!(report.output_path.is_none());
        assert_eq!(report.parallel_savings(), Duration::from_secs(15));
    }

    #[test]
    fn test_report_json_shape() {
        let report = RunReport::new(RunId::from_string("r1"), Utc::now(), &video_ok(4), &audio_failed(2))
            .finish(Duration::from_millis(4500));
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["run_id"], "r1");
        assert_eq!(json["outcome"], "video_only_succeeded");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["total_elapsed"], 4.5);
        assert_eq!(json["audio"]["failure"]["kind"], "provider");
        assert!(json.get("output_path").is_none());
    }

    #[test]
    fn test_narration_report_status_follows_audio() {
        let report = NarrationReport::new(RunId::new(), Utc::now(), &audio_failed(3), Duration::from_secs(3));
        assert_eq!(report.status, RunStatus::Failed);
        assert!(report.output_path.is_none());
        assert!(report.to_string().contains("audio  FAILED"));

        let audio = JobResult::success(
            JobArtifact {
                path: PathBuf::from("/work/audio.mp3"),
                size_bytes: 64,
                metadata: ProviderMetadata::Narration {
                    request_id: "r".into(),
                    audio_url: "https://cdn/a.mp3".into(),
                },
            },
            Duration::from_secs(12),
        );
        let report = NarrationReport::new(RunId::new(), Utc::now(), &audio, Duration::from_secs(12));
        assert!(report.is_success());
        assert_eq!(report.output_path, Some(PathBuf::from("/work/audio.mp3")));
    }
}
