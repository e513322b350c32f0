//! Concurrent generation and muxing orchestrator.
//!
//! This crate provides:
//! - Configuration loaded once at startup
//! - The two-way join over the video and narration jobs
//! - The combine / pass-through / abort decision and its execution
//! - Run logging and metrics

pub mod config;
pub mod error;
pub mod input;
pub mod logging;
pub mod metrics;
pub mod orchestrator;

pub use config::OrchestratorConfig;
pub use error::{OrchestratorError, OrchestratorResult};
pub use logging::RunLogger;
pub use orchestrator::Orchestrator;
