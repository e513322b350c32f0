//! Client error types.

use avgen_models::{FailureKind, JobFailure};
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Whether a status query that failed this way should simply be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Network(e) => !e.is_decode(),
            ClientError::HttpStatus { .. } => true,
            _ => false,
        }
    }

    /// Diagnostic category for the job result.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ClientError::Network(e) if e.is_timeout() => FailureKind::Timeout,
            ClientError::Network(e) if e.is_decode() => FailureKind::Provider,
            ClientError::Network(_) => FailureKind::Transport,
            ClientError::Timeout(_) => FailureKind::Timeout,
            ClientError::HttpStatus { .. }
            | ClientError::Provider(_)
            | ClientError::InvalidResponse(_)
            | ClientError::Json(_)
            | ClientError::Decode(_) => FailureKind::Provider,
            ClientError::Config(_) | ClientError::Io(_) => FailureKind::Internal,
        }
    }

    /// Convert into the job-level failure record.
    pub fn to_failure(&self) -> JobFailure {
        JobFailure::new(self.failure_kind(), self.to_string())
    }
}
