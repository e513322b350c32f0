//! Per-task job results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::duration_secs;

/// Which of the two generation tasks a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Video,
    Audio,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Video => "video",
            JobKind::Audio => "audio",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse failure category.
///
/// Only used for diagnostics; the orchestrator treats every kind the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Provider unreachable or the connection broke
    Transport,
    /// The remote job reported a failure or returned something unusable
    Provider,
    /// A provider timeout or the poll ceiling was hit
    Timeout,
    /// Local failure (filesystem, panicked task)
    Internal,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::Provider => "provider",
            FailureKind::Timeout => "timeout",
            FailureKind::Internal => "internal",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a job failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub reason: String,
}

impl JobFailure {
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind, self.reason)
    }
}

/// Metadata returned by a provider alongside the artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum ProviderMetadata {
    Video {
        /// Seed actually used (assigned by the provider when not requested)
        seed: Option<u64>,
        duration_seconds: Option<f64>,
        width: Option<u32>,
        height: Option<u32>,
        fps: Option<u32>,
        num_frames: Option<u32>,
        /// Time the provider spent generating, as it reported it
        generation_time_seconds: Option<f64>,
    },
    Narration {
        request_id: String,
        audio_url: String,
    },
}

/// A generated artifact on local disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobArtifact {
    /// Where the artifact was written
    pub path: PathBuf,
    /// Size in bytes
    pub size_bytes: u64,
    /// Provider-reported details
    pub metadata: ProviderMetadata,
}

/// Terminal result of one generation task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobResult {
    Success {
        artifact: JobArtifact,
        #[serde(with = "duration_secs")]
        elapsed: Duration,
    },
    Failure {
        failure: JobFailure,
        #[serde(with = "duration_secs")]
        elapsed: Duration,
    },
}

impl JobResult {
    pub fn success(artifact: JobArtifact, elapsed: Duration) -> Self {
        Self::Success { artifact, elapsed }
    }

    pub fn failure(failure: JobFailure, elapsed: Duration) -> Self {
        Self::Failure { failure, elapsed }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobResult::Success { .. })
    }

    /// Wall-clock time the task took, whatever the outcome.
    pub fn elapsed(&self) -> Duration {
        match self {
            JobResult::Success { elapsed, .. } | JobResult::Failure { elapsed, .. } => *elapsed,
        }
    }

    pub fn artifact(&self) -> Option<&JobArtifact> {
        match self {
            JobResult::Success { artifact, .. } => Some(artifact),
            JobResult::Failure { .. } => None,
        }
    }

    pub fn failure_info(&self) -> Option<&JobFailure> {
        match self {
            JobResult::Success { .. } => None,
            JobResult::Failure { failure, .. } => Some(failure),
        }
    }
}
