//! Narration (text-to-speech) provider client.
//!
//! The provider is asynchronous: a submit call returns a request id, the
//! status endpoint is polled until the job settles, and the finished job's
//! result document points at an audio file to download.

use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use avgen_models::{JobArtifact, JobKind, NarrationRequest, ProviderMetadata};

use crate::client::RemoteJobClient;
use crate::config::NarrationClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::poll::{AsyncPollLoop, PollStatus, StatusSource};
use crate::types::{JobHandle, ResultResponse, StatusResponse, SubmitInput, SubmitRequest, SubmitResponse};

/// Client for the async-invoke narration API.
pub struct NarrationClient {
    http: Client,
    config: NarrationClientConfig,
}

impl NarrationClient {
    pub fn new(config: NarrationClientConfig) -> ClientResult<Self> {
        config.validate()?;

        // Every call sets its own timeout
        let http = Client::builder().build().map_err(ClientError::Network)?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &NarrationClientConfig {
        &self.config
    }

    fn invoke_url(&self) -> String {
        format!("{}/v1/async-invoke", self.config.base_url())
    }

    fn job_url(&self, handle: &JobHandle) -> String {
        format!(
            "{}/{}",
            self.invoke_url(),
            urlencoding::encode(&handle.request_id)
        )
    }

    /// Submit a job and return its handle.
    pub async fn submit(&self, request: &NarrationRequest) -> ClientResult<JobHandle> {
        let body = SubmitRequest {
            model_id: &request.model_id,
            input: SubmitInput {
                text: &request.text,
            },
            tags: &request.tags,
        };

        debug!("Submitting narration job to {}", self.invoke_url());

        let response = self
            .http
            .post(self.invoke_url())
            .bearer_auth(&self.config.api_key)
            .timeout(self.config.request_timeout)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let submitted: SubmitResponse = serde_json::from_str(&text)
            .map_err(|e| ClientError::invalid_response(format!("submit response: {}", e)))?;

        let request_id = submitted
            .request_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ClientError::invalid_response(format!("submit response had no request_id: {}", text)))?;

        info!(request_id = %request_id, "Narration job submitted");
        Ok(JobHandle::new(request_id))
    }

    /// Query the job status once.
    ///
    /// A completed job is resolved to its audio URL here, so the poll loop
    /// only ever sees a location it can hand back.
    pub async fn status(&self, handle: &JobHandle) -> ClientResult<PollStatus> {
        let response = self
            .http
            .get(format!("{}/status", self.job_url(handle)))
            .bearer_auth(&self.config.api_key)
            .timeout(self.config.status_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let parsed: StatusResponse = serde_json::from_str(&text)
            .map_err(|e| ClientError::invalid_response(format!("status response: {}", e)))?;
        let label = parsed.status.unwrap_or_default().to_ascii_uppercase();

        match label.as_str() {
            "COMPLETE" | "COMPLETED" | "SUCCEEDED" => {
                let result_location = self.result_location(handle).await?;
                Ok(PollStatus::Complete { result_location })
            }
            "FAILED" | "ERROR" | "CANCELLED" => Ok(PollStatus::Failed { payload: text }),
            _ => Ok(PollStatus::Pending(label)),
        }
    }

    /// Fetch the result document of a completed job and extract the audio URL.
    pub async fn result_location(&self, handle: &JobHandle) -> ClientResult<String> {
        let response = self
            .http
            .get(self.job_url(handle))
            .bearer_auth(&self.config.api_key)
            .timeout(self.config.status_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::provider(format!(
                "result fetch returned {}: {}",
                status, body
            )));
        }

        let text = response.text().await?;
        let result: ResultResponse = serde_json::from_str(&text)
            .map_err(|e| ClientError::invalid_response(format!("result response: {}", e)))?;

        result
            .audio_url()
            .ok_or_else(|| ClientError::invalid_response(format!("no audio_url in result: {}", text)))
    }

    /// Stream the audio at `url` into `dest`. Returns the bytes written.
    pub async fn download(&self, url: &str, dest: &Path) -> ClientResult<u64> {
        let mut response = self
            .http
            .get(url)
            .timeout(self.config.download_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        if written == 0 {
            let _ = tokio::fs::remove_file(dest).await;
            return Err(ClientError::invalid_response("downloaded audio was empty"));
        }

        debug!("Downloaded {} bytes to {}", written, dest.display());
        Ok(written)
    }
}

#[async_trait]
impl StatusSource for NarrationClient {
    type Handle = JobHandle;

    async fn query(&self, handle: &JobHandle) -> ClientResult<PollStatus> {
        self.status(handle).await
    }
}

#[async_trait]
impl RemoteJobClient for NarrationClient {
    type Request = NarrationRequest;

    fn kind(&self) -> JobKind {
        JobKind::Audio
    }

    async fn generate(&self, request: &NarrationRequest, output: &Path) -> ClientResult<JobArtifact> {
        info!(
            model = %request.model_id,
            chars = request.text.chars().count(),
            "Generating narration"
        );

        let handle = self.submit(request).await?;
        let request_id = handle.request_id.clone();

        let audio_url = AsyncPollLoop::new(self, handle, self.config.poll.clone())
            .run()
            .await?;

        let size_bytes = self.download(&audio_url, output).await?;
        info!(
            request_id = %request_id,
            "Audio saved to {} ({} bytes)",
            output.display(),
            size_bytes
        );

        Ok(JobArtifact {
            path: output.to_path_buf(),
            size_bytes,
            metadata: ProviderMetadata::Narration {
                request_id,
                audio_url,
            },
        })
    }
}
