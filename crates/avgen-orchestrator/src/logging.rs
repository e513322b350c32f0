//! Structured run logging utilities.
//!
//! Provides consistent, structured logging for a run with tracing spans
//! and contextual information.

use tracing::{error, info, warn, Span};

use avgen_models::{JobKind, JobResult, RunId};

/// Run logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
}

impl RunLogger {
    pub fn new(run_id: &RunId) -> Self {
        Self {
            run_id: run_id.to_string(),
        }
    }

    /// Log the start of a run.
    pub fn log_start(&self, message: &str) {
        info!(run_id = %self.run_id, "Run started: {}", message);
    }

    /// Log a progress update during the run.
    pub fn log_progress(&self, message: &str) {
        info!(run_id = %self.run_id, "Run progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(run_id = %self.run_id, "Run warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(run_id = %self.run_id, "Run error: {}", message);
    }

    /// Log the completion of a run.
    pub fn log_completion(&self, message: &str) {
        info!(run_id = %self.run_id, "Run completed: {}", message);
    }

    /// Log one generation task reaching a terminal state.
    pub fn log_task(&self, kind: JobKind, result: &JobResult) {
        let elapsed_secs = result.elapsed().as_secs_f64();
        match result.failure_info() {
            None => info!(
                run_id = %self.run_id,
                task = %kind,
                elapsed_secs,
                "Task succeeded"
            ),
            Some(failure) => warn!(
                run_id = %self.run_id,
                task = %kind,
                elapsed_secs,
                failure_kind = %failure.kind,
                "Task failed: {}",
                failure.reason
            ),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Create a tracing span for this run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("run", run_id = %self.run_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_logger_creation() {
        let run_id = RunId::from_string("run-123");
        let logger = RunLogger::new(&run_id);

        assert_eq!(logger.run_id(), "run-123");
    }
}
