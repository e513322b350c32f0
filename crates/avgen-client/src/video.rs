//! Video provider HTTP client.

use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use tracing::{debug, info, warn};

use avgen_models::{JobArtifact, JobKind, ProviderMetadata, VideoRequest};

use crate::client::RemoteJobClient;
use crate::config::VideoClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::types::{HealthResponse, VideoGenerateResponse};

/// Client for the synchronous text-to-video endpoint.
///
/// One POST blocks for the whole generation; the configured timeout is the
/// only bound.
pub struct VideoClient {
    http: Client,
    config: VideoClientConfig,
}

impl VideoClient {
    /// Create a new video client.
    pub fn new(config: VideoClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &VideoClientConfig {
        &self.config
    }

    /// Check if the video service is healthy.
    pub async fn health_check(&self) -> ClientResult<bool> {
        let url = self
            .config
            .health_url
            .as_deref()
            .ok_or_else(|| ClientError::config("no video health url configured"))?;

        match self.http.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("Video service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Video service health check error: {}", e);
                Ok(false)
            }
        }
    }

    async fn call(&self, request: &VideoRequest) -> ClientResult<VideoGenerateResponse> {
        debug!("Sending video generation request to {}", self.config.endpoint);

        let response = self
            .http
            .post(&self.config.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| self.map_transport(e))?;
        serde_json::from_str(&body)
            .map_err(|e| ClientError::invalid_response(format!("video response: {}", e)))
    }

    async fn fetch_video_url(&self, url: &str) -> ClientResult<Vec<u8>> {
        let response = self.http.get(url).send().await.map_err(|e| self.map_transport(e))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await.map_err(|e| self.map_transport(e))?;
        Ok(bytes.to_vec())
    }

    fn map_transport(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout(self.config.timeout.as_secs())
        } else {
            ClientError::Network(e)
        }
    }
}

#[async_trait]
impl RemoteJobClient for VideoClient {
    type Request = VideoRequest;

    fn kind(&self) -> JobKind {
        JobKind::Video
    }

    async fn generate(&self, request: &VideoRequest, output: &Path) -> ClientResult<JobArtifact> {
        info!(
            frames = request.num_frames,
            width = request.width,
            height = request.height,
            steps = request.num_inference_steps,
            "Generating video for prompt: {:.80}",
            request.prompt
        );

        let response = self.call(request).await?;

        if let Some(error) = response.error.as_deref() {
            return Err(ClientError::provider(error.to_string()));
        }

        let bytes = match (&response.video_base64, &response.video_url) {
            (Some(encoded), _) => base64::engine::general_purpose::STANDARD.decode(encoded.trim())?,
            (None, Some(url)) => self.fetch_video_url(url).await?,
            (None, None) => {
                return Err(ClientError::invalid_response(
                    "response carried neither video_base64 nor video_url",
                ))
            }
        };

        if bytes.is_empty() {
            return Err(ClientError::invalid_response("provider returned an empty video"));
        }

        tokio::fs::write(output, &bytes).await?;

        let seed = response.seed.or(request.seed);
        info!(
            seed = ?seed,
            generation_time_secs = ?response.generation_time_seconds,
            "Video saved to {} ({} bytes)",
            output.display(),
            bytes.len()
        );

        Ok(JobArtifact {
            path: output.to_path_buf(),
            size_bytes: bytes.len() as u64,
            metadata: ProviderMetadata::Video {
                seed,
                duration_seconds: response.duration_seconds,
                width: response.width,
                height: response.height,
                fps: response.fps,
                num_frames: response.num_frames,
                generation_time_seconds: response.generation_time_seconds,
            },
        })
    }
}
