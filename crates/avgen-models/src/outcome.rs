//! Combination decision table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened to the two generation tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinationOutcome {
    BothSucceeded,
    VideoOnlySucceeded,
    AudioOnlySucceeded,
    BothFailed,
}

/// What the orchestrator does about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinationAction {
    /// Mux video and audio into one file
    Combine,
    /// Deliver the video alone
    PassThrough,
    /// Produce nothing; video is mandatory
    Abort,
}

impl CombinationOutcome {
    /// Classify a pair of task outcomes.
    pub fn from_results(video_ok: bool, audio_ok: bool) -> Self {
        match (video_ok, audio_ok) {
            (true, true) => CombinationOutcome::BothSucceeded,
            (true, false) => CombinationOutcome::VideoOnlySucceeded,
            (false, true) => CombinationOutcome::AudioOnlySucceeded,
            (false, false) => CombinationOutcome::BothFailed,
        }
    }

    /// The action mandated for this outcome.
    pub fn action(&self) -> CombinationAction {
        match self {
            CombinationOutcome::BothSucceeded => CombinationAction::Combine,
            CombinationOutcome::VideoOnlySucceeded => CombinationAction::PassThrough,
            CombinationOutcome::AudioOnlySucceeded | CombinationOutcome::BothFailed => {
                CombinationAction::Abort
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CombinationOutcome::BothSucceeded => "both_succeeded",
            CombinationOutcome::VideoOnlySucceeded => "video_only_succeeded",
            CombinationOutcome::AudioOnlySucceeded => "audio_only_succeeded",
            CombinationOutcome::BothFailed => "both_failed",
        }
    }
}

impl fmt::Display for CombinationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CombinationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CombinationAction::Combine => "combine",
            CombinationAction::PassThrough => "pass_through",
            CombinationAction::Abort => "abort",
        }
    }
}

impl fmt::Display for CombinationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
