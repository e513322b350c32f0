//! The two-way join and the decision that follows it.
//!
//! Video and narration run as two independent tasks. Whichever finishes
//! first is recorded in its own slot, then the join keeps waiting for the
//! other one. Only once both slots are filled does the run pick its action:
//!
//! | video   | audio   | action                                   |
//! |---------|---------|------------------------------------------|
//! | success | success | mux both into `final_with_audio.mp4`     |
//! | success | failure | copy the video to `final_video_only.mp4` |
//! | failure | any     | abort, nothing is delivered              |
//!
//! A failed mux is not downgraded to a video-only delivery.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, Instrument};

use avgen_client::{NarrationClient, RemoteJobClient, VideoClient};
use avgen_media::{copy_file, Combiner, FfmpegMuxer};
use avgen_models::{
    CombinationAction, FailureKind, GenerationRequest, JobFailure, JobKind, JobResult,
    NarrationReport, NarrationRequest, RunId, RunReport, VideoRequest,
};

use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::logging::RunLogger;
use crate::metrics;

pub const VIDEO_FILE: &str = "video.mp4";
pub const AUDIO_FILE: &str = "audio.mp3";
pub const COMBINED_FILE: &str = "final_with_audio.mp4";
pub const VIDEO_ONLY_FILE: &str = "final_video_only.mp4";
pub const REPORT_FILE: &str = "report.json";

/// Runs one generation request end to end.
pub struct Orchestrator {
    video: Arc<dyn RemoteJobClient<Request = VideoRequest>>,
    audio: Arc<dyn RemoteJobClient<Request = NarrationRequest>>,
    combiner: Arc<dyn Combiner>,
    work_dir: PathBuf,
}

impl Orchestrator {
    pub fn new(
        video: Arc<dyn RemoteJobClient<Request = VideoRequest>>,
        audio: Arc<dyn RemoteJobClient<Request = NarrationRequest>>,
        combiner: Arc<dyn Combiner>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            video,
            audio,
            combiner,
            work_dir: work_dir.into(),
        }
    }

    /// Build the real HTTP clients and the FFmpeg muxer.
    pub fn from_config(config: &OrchestratorConfig) -> OrchestratorResult<Self> {
        let video = VideoClient::new(config.video.clone())
            .map_err(|e| OrchestratorError::configuration(e.to_string()))?;
        let audio = NarrationClient::new(config.narration.clone())
            .map_err(|e| OrchestratorError::configuration(e.to_string()))?;

        Ok(Self::new(
            Arc::new(video),
            Arc::new(audio),
            Arc::new(FfmpegMuxer::new(config.muxer.clone())),
            config.work_dir.clone(),
        ))
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Run both generation jobs, then combine, pass through or abort.
    ///
    /// Errors are returned only for problems found before any remote work
    /// starts, or when the run directory cannot be written. Task failures
    /// and a failed mux end up in the report.
    pub async fn run(&self, request: &GenerationRequest) -> OrchestratorResult<RunReport> {
        request.validate().map_err(OrchestratorError::invalid_request)?;
        self.run_with_id(RunId::new(), request).await
    }

    pub async fn run_with_id(&self, run_id: RunId, request: &GenerationRequest) -> OrchestratorResult<RunReport> {
        let logger = RunLogger::new(&run_id);
        let span = logger.create_span();
        self.execute(run_id, request, &logger).instrument(span).await
    }

    async fn execute(&self, run_id: RunId, request: &GenerationRequest, logger: &RunLogger) -> OrchestratorResult<RunReport> {
        let run_dir = self.work_dir.join(run_id.as_str());
        tokio::fs::create_dir_all(&run_dir).await?;

        let started_at = Utc::now();
        let clock = Instant::now();
        logger.log_start(&format!("working in {}", run_dir.display()));

        let (video, audio) = self.join(request, &run_dir, logger).await;

        let report = RunReport::new(run_id, started_at, &video, &audio);
        logger.log_progress(&format!(
            "outcome {} -> {:?}",
            report.outcome, report.action
        ));

        let report = match report.action {
            CombinationAction::Combine => self.combine(report, &video, &audio, &run_dir, logger).await,
            CombinationAction::PassThrough => self.pass_through(report, &video, &run_dir, logger).await,
            CombinationAction::Abort => {
                logger.log_error("video generation failed, nothing to deliver");
                report
            }
        };

        let report = report.finish(clock.elapsed());
        metrics::record_run(&report);

        let body = serde_json::to_vec_pretty(&report)?;
        tokio::fs::write(run_dir.join(REPORT_FILE), body).await?;

        logger.log_completion(&format!(
            "{} in {:.1}s",
            report.status.as_str(),
            report.total_elapsed.as_secs_f64()
        ));
        Ok(report)
    }

    /// Generate the narration alone, with no video job and no mux.
    ///
    /// The audio lands in the run directory next to a `report.json` that
    /// holds only the audio task.
    pub async fn run_narration_only(&self, request: &NarrationRequest) -> OrchestratorResult<NarrationReport> {
        request.validate().map_err(OrchestratorError::invalid_request)?;

        let run_id = RunId::new();
        let logger = RunLogger::new(&run_id);
        let span = logger.create_span();
        self.execute_narration(run_id, request, &logger).instrument(span).await
    }

    async fn execute_narration(
        &self,
        run_id: RunId,
        request: &NarrationRequest,
        logger: &RunLogger,
    ) -> OrchestratorResult<NarrationReport> {
        let run_dir = self.work_dir.join(run_id.as_str());
        tokio::fs::create_dir_all(&run_dir).await?;

        let started_at = Utc::now();
        let clock = Instant::now();
        logger.log_start(&format!("narration only, working in {}", run_dir.display()));

        let (kind, audio) = run_job(self.audio.clone(), request.clone(), run_dir.join(AUDIO_FILE)).await;
        logger.log_task(kind, &audio);

        let report = NarrationReport::new(run_id, started_at, &audio, clock.elapsed());

        let body = serde_json::to_vec_pretty(&report)?;
        tokio::fs::write(run_dir.join(REPORT_FILE), body).await?;

        logger.log_completion(&format!(
            "narration {} in {:.1}s",
            report.status.as_str(),
            report.total_elapsed.as_secs_f64()
        ));
        Ok(report)
    }

    /// Wait for both tasks, in whatever order they finish.
    async fn join(&self, request: &GenerationRequest, run_dir: &Path, logger: &RunLogger) -> (JobResult, JobResult) {
        let mut tasks = JoinSet::new();
        tasks.spawn(
            run_job(self.video.clone(), request.video.clone(), run_dir.join(VIDEO_FILE)).in_current_span(),
        );
        tasks.spawn(
            run_job(self.audio.clone(), request.narration.clone(), run_dir.join(AUDIO_FILE)).in_current_span(),
        );

        let mut video = None;
        let mut audio = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((kind, result)) => {
                    logger.log_task(kind, &result);
                    match kind {
                        JobKind::Video => video = Some(result),
                        JobKind::Audio => audio = Some(result),
                    }
                }
                Err(e) => logger.log_error(&format!("generation task did not complete: {}", e)),
            }
        }

        let lost = |kind: JobKind| {
            error!(task = %kind, "No result was recorded for task");
            JobResult::failure(
                JobFailure::new(FailureKind::Internal, "task ended without a result"),
                std::time::Duration::ZERO,
            )
        };

        (
            video.unwrap_or_else(|| lost(JobKind::Video)),
            audio.unwrap_or_else(|| lost(JobKind::Audio)),
        )
    }

    async fn combine(
        &self,
        report: RunReport,
        video: &JobResult,
        audio: &JobResult,
        run_dir: &Path,
        logger: &RunLogger,
    ) -> RunReport {
        let (Some(video), Some(audio)) = (video.artifact(), audio.artifact()) else {
            return report.with_error("combine requested without both artifacts");
        };

        let output = run_dir.join(COMBINED_FILE);
        match self.combiner.combine(&video.path, &audio.path, &output).await {
            Ok(muxed) => {
                logger.log_progress(&format!(
                    "muxed {:.2}s of output in {:.1}s",
                    muxed.plan.output_duration(),
                    muxed.elapsed.as_secs_f64()
                ));
                report.with_output(muxed.path, Some(muxed.elapsed))
            }
            Err(e) => {
                let err = OrchestratorError::Mux(e);
                logger.log_error(&err.to_string());
                report.with_error(err.to_string())
            }
        }
    }

    async fn pass_through(&self, report: RunReport, video: &JobResult, run_dir: &Path, logger: &RunLogger) -> RunReport {
        let Some(video) = video.artifact() else {
            return report.with_error("pass-through requested without a video artifact");
        };

        logger.log_warning("narration failed, delivering video without audio");

        let output = run_dir.join(VIDEO_ONLY_FILE);
        match copy_file(&video.path, &output).await {
            Ok(_) => report.with_output(output, None),
            Err(e) => {
                let err = OrchestratorError::Delivery(e);
                logger.log_error(&err.to_string());
                report.with_error(err.to_string())
            }
        }
    }
}

/// Drive one client to a terminal result. Never panics outward.
async fn run_job<R>(
    client: Arc<dyn RemoteJobClient<Request = R>>,
    request: R,
    output: PathBuf,
) -> (JobKind, JobResult)
where
    R: Send + Sync + 'static,
{
    let kind = client.kind();
    let start = Instant::now();

    let outcome = AssertUnwindSafe(client.generate(&request, &output))
        .catch_unwind()
        .await;
    let elapsed = start.elapsed();

    let result = match outcome {
        Ok(Ok(artifact)) => JobResult::success(artifact, elapsed),
        Ok(Err(e)) => JobResult::failure(e.to_failure(), elapsed),
        Err(panic) => JobResult::failure(
            JobFailure::new(FailureKind::Internal, format!("task panicked: {}", panic_message(&*panic))),
            elapsed,
        ),
    };

    metrics::record_job(kind, &result);
    (kind, result)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
