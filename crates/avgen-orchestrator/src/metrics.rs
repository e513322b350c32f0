//! Prometheus metrics for orchestration runs.

use std::path::Path;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use avgen_models::{JobKind, JobResult, RunReport};

/// Install the Prometheus recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Write the current snapshot in Prometheus text format.
pub async fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, handle.render()).await
}

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_TOTAL: &str = "avgen_jobs_total";
    pub const JOB_DURATION_SECONDS: &str = "avgen_job_duration_seconds";
    pub const RUNS_TOTAL: &str = "avgen_runs_total";
}

/// Record one finished generation task.
pub fn record_job(kind: JobKind, result: &JobResult) {
    let status = if result.is_success() { "success" } else { "failure" };
    let labels = [("kind", kind.as_str().to_string()), ("status", status.to_string())];
    counter!(names::JOBS_TOTAL, &labels).increment(1);

    let labels = [("kind", kind.as_str().to_string())];
    histogram!(names::JOB_DURATION_SECONDS, &labels).record(result.elapsed().as_secs_f64());
}

/// Record a finished run.
pub fn record_run(report: &RunReport) {
    let labels = [
        ("outcome", report.outcome.as_str().to_string()),
        ("status", report.status.as_str().to_string()),
    ];
    counter!(names::RUNS_TOTAL, &labels).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_renders_recorded_jobs() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            counter!(names::JOBS_TOTAL, "kind" => "video", "status" => "success").increment(1);
        });

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out").join("metrics.prom");
        write_snapshot(&handle, &path).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("avgen_jobs_total"));
        assert!(text.contains("kind=\"video\""));
    }
}
