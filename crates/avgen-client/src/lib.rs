//! Clients for the remote generation providers.
//!
//! Both providers sit behind the same [`RemoteJobClient`] contract:
//! - [`VideoClient`] makes one long blocking call and gets the video back
//! - [`NarrationClient`] submits a job, then drives an [`AsyncPollLoop`]
//!   until the job completes, fails or runs out of time

pub mod client;
pub mod config;
pub mod error;
pub mod narration;
pub mod poll;
pub mod types;
pub mod video;

pub use client::RemoteJobClient;
pub use config::{NarrationClientConfig, VideoClientConfig};
pub use error::{ClientError, ClientResult};
pub use narration::NarrationClient;
pub use poll::{AsyncPollLoop, PollConfig, PollState, PollStatus, StatusSource};
pub use types::JobHandle;
pub use video::VideoClient;
