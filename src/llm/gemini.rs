use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::{Config, DEFAULT_GEMINI_API_BASE_URL};
use crate::llm::media::{truncate_for_log, ImagePayload};
use crate::llm::types::{GenerationError, GeneratedImage, ImageGenerator};
use crate::utils::timing::log_llm_timing;

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
    Text {
        text: String,
    },
    Other(Value),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

const GEMINI_RETRY_BASE_DELAY_MS: u64 = 900;
const GEMINI_MAX_ATTEMPTS_CAP: usize = 2;

fn gemini_should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

fn gemini_should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn gemini_retry_delay(attempt: usize) -> Duration {
    let attempt = attempt.max(1) as u64;
    Duration::from_millis(GEMINI_RETRY_BASE_DELAY_MS.saturating_mul(attempt))
}

fn build_safety_settings(profile: &str) -> Vec<Value> {
    let threshold = match profile {
        "standard" => "BLOCK_MEDIUM_AND_ABOVE",
        "permissive" => "OFF",
        _ => {
            warn!(
                "Unknown GEMINI_SAFETY_SETTINGS value '{}', using permissive defaults.",
                profile
            );
            "OFF"
        }
    };

    vec![
        json!({ "category": "HARM_CATEGORY_HARASSMENT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_CIVIC_INTEGRITY", "threshold": threshold }),
    ]
}

/// Text instruction first, then the reference image as an inline part.
fn build_generation_payload(instruction: &str, image: &ImagePayload, safety_profile: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [
                { "text": instruction },
                {
                    "inlineData": {
                        "mimeType": image.mime_type,
                        "data": image.data
                    }
                }
            ]
        }],
        "generationConfig": {
            "responseModalities": ["TEXT", "IMAGE"]
        },
        "safetySettings": build_safety_settings(safety_profile),
    })
}

fn summarize_gemini_parts(parts: &[Value]) -> Vec<Value> {
    parts
        .iter()
        .map(|part| {
            if let Some(text) = part.get("text").and_then(|value| value.as_str()) {
                json!({ "text": truncate_for_log(text, 200) })
            } else if let Some(inline_data) = part.get("inlineData") {
                let mime_type = inline_data
                    .get("mimeType")
                    .and_then(|value| value.as_str())
                    .unwrap_or("unknown");
                let data_len = inline_data
                    .get("data")
                    .and_then(|value| value.as_str())
                    .map(|value| value.len())
                    .unwrap_or(0);
                json!({ "inlineData": { "mimeType": mime_type, "dataLen": data_len } })
            } else {
                json!({ "unknownPart": true })
            }
        })
        .collect()
}

fn summarize_gemini_payload(payload: &Value) -> Value {
    let mut summary = Map::new();

    if let Some(contents) = payload.get("contents").and_then(|value| value.as_array()) {
        let summarized_contents: Vec<Value> = contents
            .iter()
            .map(|content| {
                let role = content
                    .get("role")
                    .and_then(|value| value.as_str())
                    .unwrap_or("user");
                let parts = content
                    .get("parts")
                    .and_then(|value| value.as_array())
                    .map(|parts| summarize_gemini_parts(parts))
                    .unwrap_or_default();
                json!({ "role": role, "parts": parts })
            })
            .collect();
        summary.insert("contents".to_string(), Value::Array(summarized_contents));
    }

    if let Some(config) = payload.get("generationConfig") {
        summary.insert("generationConfig".to_string(), config.clone());
    }

    if let Some(safety) = payload
        .get("safetySettings")
        .and_then(|value| value.as_array())
    {
        summary.insert("safetySettingsCount".to_string(), json!(safety.len()));
    }

    Value::Object(summary)
}

fn first_candidate_parts(response: &GeminiResponse) -> &[GeminiPart] {
    response
        .candidates
        .as_deref()
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.content.as_ref())
        .and_then(|content| content.parts.as_deref())
        .unwrap_or(&[])
}

fn summarize_gemini_response(response: &GeminiResponse) -> Value {
    let mut text_parts = 0usize;
    let mut image_parts = 0usize;
    let mut other_parts = 0usize;

    for part in first_candidate_parts(response) {
        match part {
            GeminiPart::InlineData { .. } => image_parts += 1,
            GeminiPart::Text { .. } => text_parts += 1,
            GeminiPart::Other(_) => other_parts += 1,
        }
    }

    json!({
        "candidates": response.candidates.as_ref().map(|candidates| candidates.len()).unwrap_or(0),
        "textParts": text_parts,
        "inlineParts": image_parts,
        "otherParts": other_parts,
        "textPreview": first_text_preview(first_candidate_parts(response)),
    })
}

fn first_text_preview(parts: &[GeminiPart]) -> Option<String> {
    parts.iter().find_map(|part| match part {
        GeminiPart::Text { text } if !text.trim().is_empty() => Some(truncate_for_log(text, 200)),
        _ => None,
    })
}

fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

/// Returns the first inline part of the first candidate as a generated image.
fn extract_first_image(
    response: &GeminiResponse,
    model: &str,
) -> Result<GeneratedImage, GenerationError> {
    let parts = first_candidate_parts(response);
    if parts.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    parts
        .iter()
        .find_map(|part| match part {
            GeminiPart::InlineData { inline_data } => Some(GeneratedImage::new(
                inline_data.mime_type.clone(),
                inline_data.data.clone(),
            )),
            _ => None,
        })
        .ok_or_else(|| GenerationError::NoImage {
            model: model.to_string(),
            text_preview: first_text_preview(parts),
        })
}

#[derive(Debug, Clone)]
pub struct GeminiImageClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    safety_profile: String,
    timeout: Duration,
    max_attempts: usize,
}

impl GeminiImageClient {
    pub fn new(http: Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_GEMINI_API_BASE_URL.to_string(),
            model: model.into(),
            safety_profile: "permissive".to_string(),
            timeout: Duration::from_secs(90),
            max_attempts: GEMINI_MAX_ATTEMPTS_CAP,
        }
    }

    pub fn from_config(http: Client, config: &Config) -> Self {
        Self::new(http, config.gemini_api_key.clone(), config.gemini_image_model.clone())
            .with_base_url(config.gemini_api_base_url.clone())
            .with_safety_profile(config.gemini_safety_settings.clone())
            .with_timeout(Duration::from_secs(config.gemini_request_timeout_seconds))
            .with_max_attempts(config.gemini_max_attempts)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_safety_profile(mut self, profile: impl Into<String>) -> Self {
        self.safety_profile = profile.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts for transient failures, clamped so a request is retried
    /// at most once.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.clamp(1, GEMINI_MAX_ATTEMPTS_CAP);
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn call_gemini_api(&self, payload: &Value) -> Result<GeminiResponse, GenerationError> {
        let url = self.endpoint();

        if tracing::enabled!(tracing::Level::DEBUG) {
            let payload_summary = summarize_gemini_payload(payload);
            debug!(target: "llm.gemini", model = %self.model, payload = %payload_summary);
        }

        let mut attempt = 0usize;
        loop {
            attempt += 1;
            let response = match self
                .http
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .timeout(self.timeout)
                .json(payload)
                .send()
                .await
            {
                Ok(response) => response,
                Err(err) => {
                    let should_retry =
                        gemini_should_retry_error(&err) && attempt < self.max_attempts;
                    warn!(
                        "Gemini request failed to send: {} (timeout={}, connect={}, retrying={})",
                        err,
                        err.is_timeout(),
                        err.is_connect(),
                        should_retry
                    );
                    if should_retry {
                        tokio::time::sleep(gemini_retry_delay(attempt)).await;
                        continue;
                    }
                    return Err(GenerationError::Transport(err.to_string()));
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let (message, body_summary) = summarize_error_body(&body);
                let should_retry =
                    gemini_should_retry_status(status) && attempt < self.max_attempts;
                warn!(
                    "Gemini API error: status={}, body={}, retrying={}",
                    status, body_summary, should_retry
                );
                if should_retry {
                    tokio::time::sleep(gemini_retry_delay(attempt)).await;
                    continue;
                }
                return Err(GenerationError::Status {
                    status: status.as_u16(),
                    detail: message.unwrap_or(body_summary),
                });
            }

            let value = response
                .json::<GeminiResponse>()
                .await
                .map_err(|err| GenerationError::Transport(format!("invalid response body: {err}")))?;
            if tracing::enabled!(tracing::Level::DEBUG) {
                let response_summary = summarize_gemini_response(&value);
                debug!(target: "llm.gemini", model = %self.model, response = %response_summary);
            }
            return Ok(value);
        }
    }
}

#[async_trait]
impl ImageGenerator for GeminiImageClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        instruction: &str,
        image: &ImagePayload,
    ) -> Result<GeneratedImage, GenerationError> {
        let payload = build_generation_payload(instruction, image, &self.safety_profile);
        let metadata = json!({
            "imageMime": image.mime_type,
            "imageLen": image.data.len(),
            "instructionChars": instruction.chars().count(),
        });

        log_llm_timing("gemini", &self.model, "generate_image", Some(metadata), || async {
            let response = self.call_gemini_api(&payload).await?;
            extract_first_image(&response, &self.model)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: Value) -> GeminiResponse {
        serde_json::from_value(value).expect("fixture should deserialize")
    }

    fn sample_image() -> ImagePayload {
        ImagePayload {
            mime_type: "image/png".to_string(),
            data: "iVBORw0KGgo=".to_string(),
        }
    }

    #[test]
    fn payload_sends_text_then_inline_image() {
        let payload = build_generation_payload("make an emote", &sample_image(), "permissive");
        let parts = payload
            .pointer("/contents/0/parts")
            .and_then(|value| value.as_array())
            .unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["text"], "make an emote");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], "iVBORw0KGgo=");
        assert_eq!(payload["safetySettings"].as_array().unwrap().len(), 5);
        assert_eq!(payload["safetySettings"][0]["threshold"], "OFF");
    }

    #[test]
    fn standard_safety_profile_blocks_medium_and_above() {
        let settings = build_safety_settings("standard");
        assert!(settings
            .iter()
            .all(|entry| entry["threshold"] == "BLOCK_MEDIUM_AND_ABOVE"));
    }

    #[test]
    fn payload_summary_hides_image_bytes() {
        let payload = build_generation_payload("prompt", &sample_image(), "permissive");
        let summary = summarize_gemini_payload(&payload).to_string();
        assert!(!summary.contains("iVBORw0KGgo="));
        assert!(summary.contains("\"dataLen\":12"));
    }

    #[test]
    fn missing_or_empty_parts_is_an_empty_response() {
        for fixture in [
            json!({}),
            json!({ "candidates": [] }),
            json!({ "candidates": [{ "finishReason": "SAFETY" }] }),
            json!({ "candidates": [{ "content": { "parts": [] } }] }),
        ] {
            let response = parse(fixture);
            assert!(matches!(
                extract_first_image(&response, "m"),
                Err(GenerationError::EmptyResponse)
            ));
        }
    }

    #[test]
    fn text_only_response_is_no_image() {
        let response = parse(json!({
            "candidates": [{ "content": { "parts": [{ "text": "I can't edit this photo." }] } }]
        }));
        match extract_first_image(&response, "gemini-2.5-flash-image") {
            Err(GenerationError::NoImage { model, text_preview }) => {
                assert_eq!(model, "gemini-2.5-flash-image");
                assert_eq!(text_preview.as_deref(), Some("I can't edit this photo."));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn returns_image_from_a_later_part() {
        let response = parse(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "Here is your emote" },
                { "inlineData": { "mimeType": "image/png", "data": "AAAA" } },
                { "inlineData": { "mimeType": "image/jpeg", "data": "BBBB" } }
            ] } }]
        }));
        let image = extract_first_image(&response, "m").unwrap();
        assert_eq!(image.data_uri(), "data:image/png;base64,AAAA");
    }

    #[test]
    fn tolerates_unknown_part_shapes() {
        let response = parse(json!({
            "candidates": [{ "content": { "parts": [
                { "functionCall": { "name": "noop" } },
                { "inlineData": { "mimeType": "image/webp", "data": "CCCC" } }
            ] } }]
        }));
        let image = extract_first_image(&response, "m").unwrap();
        assert_eq!(image.mime_type, "image/webp");
    }

    #[test]
    fn error_body_prefers_the_api_message() {
        let (message, _) =
            summarize_error_body(r#"{"error":{"code":429,"message":"Quota exceeded"}}"#);
        assert_eq!(message.as_deref(), Some("Quota exceeded"));
        let (message, summary) = summarize_error_body("   ");
        assert!(message.is_none());
        assert_eq!(summary, "empty response body");
    }

    #[test]
    fn attempts_are_clamped_to_a_single_retry() {
        let client = GeminiImageClient::new(Client::new(), "key", "model").with_max_attempts(10);
        assert_eq!(client.max_attempts, 2);
        let client = client.with_max_attempts(0);
        assert_eq!(client.max_attempts, 1);
    }

    #[test]
    fn endpoint_targets_the_configured_model() {
        let client = GeminiImageClient::new(Client::new(), "key", "gemini-2.5-flash-image")
            .with_base_url("http://localhost:8080/v1beta/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
    }
}
