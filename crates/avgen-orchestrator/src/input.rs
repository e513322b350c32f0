//! Where a run's generation request comes from.

use std::path::Path;

use avgen_models::{GenerationRequest, NarrationRequest};

use crate::error::{OrchestratorError, OrchestratorResult};

/// Read a request from a JSON file.
pub async fn request_from_file(path: &Path) -> OrchestratorResult<GenerationRequest> {
    let body = tokio::fs::read(path).await?;
    let request: GenerationRequest = serde_json::from_slice(&body)
        .map_err(|e| OrchestratorError::invalid_request(format!("{}: {}", path.display(), e)))?;
    Ok(request)
}

/// Build a request from `AVGEN_VIDEO_PROMPT` and `AVGEN_NARRATION_TEXT`.
pub fn request_from_lookup<F>(lookup: F, narration_model: &str) -> OrchestratorResult<GenerationRequest>
where
    F: Fn(&str) -> Option<String>,
{
    let prompt = lookup("AVGEN_VIDEO_PROMPT")
        .ok_or_else(|| OrchestratorError::invalid_request("AVGEN_VIDEO_PROMPT is not set"))?;
    let text = lookup("AVGEN_NARRATION_TEXT")
        .ok_or_else(|| OrchestratorError::invalid_request("AVGEN_NARRATION_TEXT is not set"))?;

    let mut request = GenerationRequest::new(prompt, text);
    request.narration = request.narration.with_model(narration_model);
    Ok(request)
}

/// Read a narration request from a JSON file.
///
/// Accepts either a bare narration request or a full generation request,
/// in which case only its `narration` section is used.
pub async fn narration_from_file(path: &Path) -> OrchestratorResult<NarrationRequest> {
    let body = tokio::fs::read(path).await?;
    let invalid = |e: serde_json::Error| OrchestratorError::invalid_request(format!("{}: {}", path.display(), e));

    let mut value: serde_json::Value = serde_json::from_slice(&body).map_err(invalid)?;
    if let Some(section) = value.get_mut("narration") {
        value = section.take();
    }
    serde_json::from_value(value).map_err(invalid)
}

/// Build a narration request from `AVGEN_NARRATION_TEXT`.
pub fn narration_from_lookup<F>(lookup: F, narration_model: &str) -> OrchestratorResult<NarrationRequest>
where
    F: Fn(&str) -> Option<String>,
{
    let text = lookup("AVGEN_NARRATION_TEXT")
        .ok_or_else(|| OrchestratorError::invalid_request("AVGEN_NARRATION_TEXT is not set"))?;
    Ok(NarrationRequest::new(text).with_model(narration_model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use avgen_models::request::DEFAULT_NEGATIVE_PROMPT;

    #[tokio::test]
    async fn test_request_from_file_fills_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("request.json");
        std::fs::write(
            &path,
            r#"{"video": {"prompt": "lobsters", "seed": 7}, "narration": {"text": "hello"}}"#,
        )
        .unwrap();

        let request = request_from_file(&path).await.unwrap();

        assert_eq!(request.video.seed, Some(7));
        assert_eq!(request.video.negative_prompt, DEFAULT_NEGATIVE_PROMPT);
        assert_eq!(request.narration.text, "hello");
    }

    #[tokio::test]
    async fn test_request_from_bad_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("request.json");
        std::fs::write(&path, "{\"video\": {}}").unwrap();

        let result = request_from_file(&path).await;
        assert!(matches!(result, Err(OrchestratorError::InvalidRequest(_))));
    }

    #[test]
    fn test_request_from_lookup() {
        let lookup = |key: &str| match key {
            "AVGEN_VIDEO_PROMPT" => Some("a prompt".to_string()),
            "AVGEN_NARRATION_TEXT" => Some("some text".to_string()),
            _ => None,
        };

        let request = tokio_test::assert_ok!(request_from_lookup(lookup, "custom/tts"));
        assert_eq!(request.video.prompt, "a prompt");
        assert_eq!(request.narration.model_id, "custom/tts");

        assert!(request_from_lookup(|_: &str| None, "m").is_err());
    }

    #[tokio::test]
    async fn test_narration_from_file_accepts_both_shapes() {
        let dir = tempfile::TempDir::new().unwrap();

        let bare = dir.path().join("narration.json");
        std::fs::write(&bare, r#"{"text": "hello", "model_id": "custom/tts"}"#).unwrap();
        let request = narration_from_file(&bare).await.unwrap();
        assert_eq!(request.text, "hello");
        assert_eq!(request.model_id, "custom/tts");

        let full = dir.path().join("request.json");
        std::fs::write(
            &full,
            r#"{"video": {"prompt": "lobsters"}, "narration": {"text": "welcome"}}"#,
        )
        .unwrap();
        let request = narration_from_file(&full).await.unwrap();
        assert_eq!(request.text, "welcome");
        assert_eq!(request.model_id, avgen_models::request::DEFAULT_NARRATION_MODEL);

        std::fs::write(&bare, r#"{"model_id": "m"}"#).unwrap();
        let result = narration_from_file(&bare).await;
        assert!(matches!(result, Err(OrchestratorError::InvalidRequest(_))));
    }

    #[test]
    fn test_narration_from_lookup_needs_only_text() {
        let lookup = |key: &str| (key == "AVGEN_NARRATION_TEXT").then(|| "just audio".to_string());

        let request = tokio_test::assert_ok!(narration_from_lookup(lookup, "custom/tts"));
        assert_eq!(request.text, "just audio");
        assert_eq!(request.model_id, "custom/tts");

        assert!(narration_from_lookup(|_: &str| None, "m").is_err());
    }
}
