//! Provider wire types.

use std::fmt;

use avgen_models::RequestTag;
use serde::{Deserialize, Serialize};

/// Reference to an in-flight async-invoke job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle {
    pub request_id: String,
}

impl JobHandle {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.request_id)
    }
}

/// Video generation response. Errors come back as `{"error": "..."}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct VideoGenerateResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub video_base64: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub fps: Option<u32>,
    #[serde(default)]
    pub num_frames: Option<u32>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub generation_time_seconds: Option<f64>,
}

/// Health check response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HealthResponse {
    pub status: String,
}

/// Async-invoke submission body.
#[derive(Debug, Serialize)]
pub(crate) struct SubmitRequest<'a> {
    pub model_id: &'a str,
    pub input: SubmitInput<'a>,
    #[serde(skip_serializing_if = "no_tags")]
    pub tags: &'a [RequestTag],
}

fn no_tags(tags: &&[RequestTag]) -> bool {
    tags.is_empty()
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitInput<'a> {
    pub text: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitResponse {
    pub request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusResponse {
    pub status: Option<String>,
}

/// Completed job payload; the audio URL may sit at the top level or under `output`.
#[derive(Debug, Deserialize)]
pub(crate) struct ResultResponse {
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub output: Option<ResultOutput>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultOutput {
    #[serde(default)]
    pub audio_url: Option<String>,
}

impl ResultResponse {
    pub fn audio_url(self) -> Option<String> {
        self.audio_url
            .or_else(|| self.output.and_then(|o| o.audio_url))
            .filter(|u| !u.is_empty())
    }
}
