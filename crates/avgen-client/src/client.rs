//! The uniform contract both providers are driven through.

use std::path::Path;

use async_trait::async_trait;
use avgen_models::{JobArtifact, JobKind};

use crate::error::ClientResult;

/// A provider that turns a request into an artifact on local disk.
///
/// Implementations bound every remote call they make, so `generate` always
/// returns eventually.
#[async_trait]
pub trait RemoteJobClient: Send + Sync {
    type Request: Send + Sync;

    /// Which task this client serves.
    fn kind(&self) -> JobKind;

    /// Run the job to completion and write the artifact to `output`.
    async fn generate(&self, request: &Self::Request, output: &Path) -> ClientResult<JobArtifact>;
}
