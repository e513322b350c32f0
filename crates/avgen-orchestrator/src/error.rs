//! Orchestrator error types.

use thiserror::Error;

use avgen_media::MediaError;

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Mux error: {}", .0.detail())]
    Mux(MediaError),

    #[error("Delivery failed: {0}")]
    Delivery(MediaError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OrchestratorError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Errors raised before any remote work was started.
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            OrchestratorError::Configuration(_) | OrchestratorError::InvalidRequest(_)
        )
    }
}
