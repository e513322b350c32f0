//! Shared data models for the avgen orchestrator.
//!
//! This crate provides Serde-serializable types for:
//! - Generation requests (video prompt and narration text)
//! - Per-task job results, tagged by job kind
//! - The combination decision taken once both jobs resolve
//! - The run report emitted at the end of every run

pub mod job;
pub mod outcome;
pub mod report;
pub mod request;
pub mod run;
pub mod utils;

// Re-export common types
pub use job::{FailureKind, JobArtifact, JobFailure, JobKind, JobResult, ProviderMetadata};
pub use outcome::{CombinationAction, CombinationOutcome};
pub use report::{NarrationReport, RunReport, RunStatus, TaskReport};
pub use request::{GenerationRequest, NarrationRequest, RequestTag, VideoRequest};
pub use run::RunId;
