//! Orchestrator configuration.
//!
//! Everything is read once at startup and handed to the clients and the
//! muxer as plain structs. Nothing below this module touches the process
//! environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use avgen_client::{NarrationClientConfig, PollConfig, VideoClientConfig};
use avgen_media::MuxerConfig;
use avgen_models::request::DEFAULT_NARRATION_MODEL;

use crate::error::{OrchestratorError, OrchestratorResult};

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Video provider settings
    pub video: VideoClientConfig,
    /// Narration provider settings (includes the poll loop bounds)
    pub narration: NarrationClientConfig,
    /// Model used for requests built from the environment
    pub narration_model: String,
    /// Mux settings
    pub muxer: MuxerConfig,
    /// Work directory; each run gets its own subdirectory
    pub work_dir: PathBuf,
    /// Where to write a Prometheus snapshot after the run
    pub metrics_path: Option<PathBuf>,
}

impl OrchestratorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> OrchestratorResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> OrchestratorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| OrchestratorError::configuration(format!("{} is required", key)))
        };
        let secs = |key: &str, default: u64| -> OrchestratorResult<Duration> {
            Ok(Duration::from_secs(parse_or(get(key), key, default)?))
        };

        let video = VideoClientConfig {
            endpoint: require("AVGEN_VIDEO_ENDPOINT")?,
            health_url: get("AVGEN_VIDEO_HEALTH_URL"),
            timeout: secs("AVGEN_VIDEO_TIMEOUT_SECS", 600)?,
        };

        let poll = PollConfig::new(
            secs("AVGEN_POLL_INTERVAL_SECS", 2)?,
            secs("AVGEN_POLL_MAX_WAIT_SECS", 120)?,
        );

        let mut narration = NarrationClientConfig::new(require("AVGEN_NARRATION_API_KEY")?).with_poll(poll);
        if let Some(endpoint) = get("AVGEN_NARRATION_ENDPOINT") {
            narration = narration.with_endpoint(endpoint);
        }

        let muxer = MuxerConfig {
            timeout: secs("AVGEN_MUX_TIMEOUT_SECS", 300)?,
            ..Default::default()
        };

        let config = Self {
            video,
            narration,
            narration_model: get("AVGEN_NARRATION_MODEL")
                .unwrap_or_else(|| DEFAULT_NARRATION_MODEL.to_string()),
            muxer,
            work_dir: get("AVGEN_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("/tmp/avgen")),
            metrics_path: get("AVGEN_METRICS_PATH").map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the assembled settings.
    pub fn validate(&self) -> OrchestratorResult<()> {
        self.video
            .validate()
            .map_err(|e| OrchestratorError::configuration(e.to_string()))?;
        self.narration
            .validate()
            .map_err(|e| OrchestratorError::configuration(e.to_string()))?;
        if self.muxer.timeout.is_zero() {
            return Err(OrchestratorError::configuration("mux timeout must be positive"));
        }
        Ok(())
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> OrchestratorResult<T> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| OrchestratorError::configuration(format!("{} has invalid value '{}'", key, raw))),
    }
}
