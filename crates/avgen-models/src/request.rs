//! Generation request definitions.

use serde::{Deserialize, Serialize};

/// Default narration model served behind the async-invoke API.
pub const DEFAULT_NARRATION_MODEL: &str = "fal-ai/elevenlabs/tts/multilingual-v2";

/// Default negative prompt sent with every video request.
pub const DEFAULT_NEGATIVE_PROMPT: &str = "low quality, blurry, distorted";

/// Input for a single orchestration run.
///
/// Built once per run and shared read-only with both generation tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Text-to-video request
    pub video: VideoRequest,
    /// Text-to-speech request
    pub narration: NarrationRequest,
}

impl GenerationRequest {
    /// Create a request from a video prompt and narration text, using defaults elsewhere.
    pub fn new(prompt: impl Into<String>, narration_text: impl Into<String>) -> Self {
        Self {
            video: VideoRequest::new(prompt),
            narration: NarrationRequest::new(narration_text),
        }
    }

    /// Validate both halves of the request.
    pub fn validate(&self) -> Result<(), String> {
        self.video.validate()?;
        self.narration.validate()
    }
}

/// Parameters for the video generation provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRequest {
    /// Text description of the video to generate
    pub prompt: String,
    /// What the model should avoid
    #[serde(default = "default_negative_prompt")]
    pub negative_prompt: String,
    /// Number of frames to generate
    #[serde(default = "default_num_frames")]
    pub num_frames: u32,
    /// Output frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Output width in pixels
    #[serde(default = "default_width")]
    pub width: u32,
    /// Output height in pixels
    #[serde(default = "default_height")]
    pub height: u32,
    /// Denoising steps (quality vs. speed)
    #[serde(default = "default_inference_steps")]
    pub num_inference_steps: u32,
    /// How closely the model follows the prompt
    #[serde(default = "default_guidance_scale")]
    pub guidance_scale: f64,
    /// Seed for reproducibility; the provider assigns one when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_negative_prompt() -> String {
    DEFAULT_NEGATIVE_PROMPT.to_string()
}

fn default_num_frames() -> u32 {
    84 // ~3.5s at 24fps
}

fn default_fps() -> u32 {
    24
}

fn default_width() -> u32 {
    848
}

fn default_height() -> u32 {
    480
}

fn default_inference_steps() -> u32 {
    50
}

fn default_guidance_scale() -> f64 {
    4.5
}

impl VideoRequest {
    /// Create a request for the given prompt with default parameters.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: default_negative_prompt(),
            num_frames: default_num_frames(),
            fps: default_fps(),
            width: default_width(),
            height: default_height(),
            num_inference_steps: default_inference_steps(),
            guidance_scale: default_guidance_scale(),
            seed: None,
        }
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the frame count.
    pub fn with_num_frames(mut self, num_frames: u32) -> Self {
        self.num_frames = num_frames;
        self
    }

    /// Expected clip length in seconds.
    pub fn expected_duration(&self) -> f64 {
        if self.fps == 0 {
            return 0.0;
        }
        self.num_frames as f64 / self.fps as f64
    }

    /// Validate the request.
    pub fn validate(&self) -> Result<(), String> {
        if self.prompt.trim().is_empty() {
            return Err("prompt is required".to_string());
        }
        if self.num_frames == 0 {
            return Err("num_frames must be positive".to_string());
        }
        if self.fps == 0 {
            return Err("fps must be positive".to_string());
        }
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "invalid resolution {}x{}",
                self.width, self.height
            ));
        }
        if !(1..=500).contains(&self.num_inference_steps) {
            return Err(format!(
                "num_inference_steps must be between 1 and 500, got {}",
                self.num_inference_steps
            ));
        }
        if !self.guidance_scale.is_finite() || self.guidance_scale < 0.0 {
            return Err(format!("invalid guidance_scale {}", self.guidance_scale));
        }
        Ok(())
    }
}

/// Key/value tag attached to an async-invoke job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTag {
    pub key: String,
    pub value: String,
}

/// Parameters for the narration (text-to-speech) provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrationRequest {
    /// Provider model identifier
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Text to narrate
    pub text: String,
    /// Tags forwarded to the provider
    #[serde(default)]
    pub tags: Vec<RequestTag>,
}

fn default_model_id() -> String {
    DEFAULT_NARRATION_MODEL.to_string()
}

impl NarrationRequest {
    /// Create a request for the given text with the default model.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            model_id: default_model_id(),
            text: text.into(),
            tags: Vec::new(),
        }
    }

    /// Use a different model.
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Attach a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(RequestTag {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Validate the request.
    pub fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("narration text is required".to_string());
        }
        if self.model_id.trim().is_empty() {
            return Err("narration model_id is required".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_defaults() {
        let req = VideoRequest::new("a lobster writers room");
        assert_eq!(req.num_frames, 84);
        assert_eq!(req.fps, 24);
        assert_eq!((req.width, req.height), (848, 480));
        assert!((req.expected_duration() - 3.5).abs() < 1e-9);
        assert!(req.seed.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let req: GenerationRequest = serde_json::from_str(
            r#"{"video": {"prompt": "waves", "seed": 7}, "narration": {"text": "hello"}}"#,
        )
        .unwrap();

        assert_eq!(req.video.seed, Some(7));
        assert_eq!(req.video.negative_prompt, DEFAULT_NEGATIVE_PROMPT);
        assert_eq!(req.narration.model_id, DEFAULT_NARRATION_MODEL);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_empty_inputs() {
        assert!(GenerationRequest::new("  ", "text").validate().is_err());
        assert!(GenerationRequest::new("prompt", "").validate().is_err());

        let zero_frames = VideoRequest::new("prompt").with_num_frames(0);
        assert!(zero_frames.validate().is_err());
    }

    #[test]
    fn test_seed_omitted_when_absent() {
        let json = serde_json::to_value(VideoRequest::new("p")).unwrap();
        assert!(json.get("seed").is_none());

        let json = serde_json::to_value(VideoRequest::new("p").with_seed(42)).unwrap();
        assert_eq!(json["seed"], 42);
    }
}
