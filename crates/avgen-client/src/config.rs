//! Client configuration.
//!
//! Configs are plain values handed to the client constructors. Nothing in this
//! crate reads the process environment.

use std::time::Duration;

use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::poll::PollConfig;

/// Default async-invoke endpoint for narration.
pub const DEFAULT_NARRATION_ENDPOINT: &str = "https://inference.do-ai.run";

/// Configuration for the video provider.
#[derive(Debug, Clone)]
pub struct VideoClientConfig {
    /// Full URL of the generation endpoint
    pub endpoint: String,
    /// Optional health endpoint
    pub health_url: Option<String>,
    /// Upper bound on one generation call
    pub timeout: Duration,
}

impl Default for VideoClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/generate_video".to_string(),
            health_url: None,
            timeout: Duration::from_secs(600), // 10 minutes for generation
        }
    }
}

impl VideoClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> ClientResult<()> {
        validate_url("video endpoint", &self.endpoint)?;
        if let Some(health) = &self.health_url {
            validate_url("video health url", health)?;
        }
        if self.timeout.is_zero() {
            return Err(ClientError::config("video timeout must be positive"));
        }
        Ok(())
    }
}

/// Configuration for the narration provider.
#[derive(Clone)]
pub struct NarrationClientConfig {
    /// Base URL of the async-invoke API
    pub endpoint: String,
    /// Bearer token
    pub api_key: String,
    /// Tick interval and ceiling for status polling
    pub poll: PollConfig,
    /// Timeout for submit and result calls
    pub request_timeout: Duration,
    /// Timeout for a single status query
    pub status_timeout: Duration,
    /// Timeout for the audio download
    pub download_timeout: Duration,
}

impl std::fmt::Debug for NarrationClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrationClientConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("poll", &self.poll)
            .field("request_timeout", &self.request_timeout)
            .field("status_timeout", &self.status_timeout)
            .field("download_timeout", &self.download_timeout)
            .finish()
    }
}

impl NarrationClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_NARRATION_ENDPOINT.to_string(),
            api_key: api_key.into(),
            poll: PollConfig::default(),
            request_timeout: Duration::from_secs(30),
            status_timeout: Duration::from_secs(10),
            download_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(ClientError::config("narration api key is required"));
        }
        validate_url("narration endpoint", &self.endpoint)?;
        self.poll.validate()
    }

    /// Endpoint without a trailing slash, for path joining.
    pub(crate) fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}

fn validate_url(name: &str, value: &str) -> ClientResult<()> {
    let url = Url::parse(value)
        .map_err(|e| ClientError::config(format!("invalid {} {:?}: {}", name, value, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ClientError::config(format!(
            "{} must be http(s), got scheme {:?}",
            name, other
        ))),
    }
}
