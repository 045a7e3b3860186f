use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};

use crate::llm::media::ImagePayload;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Gemini returned an empty response (no content parts)")]
    EmptyResponse,
    #[error("Gemini did not return an image (model: {model})")]
    NoImage {
        model: String,
        text_preview: Option<String>,
    },
    #[error("Gemini request failed with status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("Gemini request failed: {0}")]
    Transport(String),
    #[error("Invalid input image: {0}")]
    InvalidImage(String),
}

impl GenerationError {
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            GenerationError::Status { .. } | GenerationError::Transport(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    /// Base64 payload exactly as returned by the service.
    pub data: String,
    pub created_at: DateTime<Utc>,
}

impl GeneratedImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
            created_at: Utc::now(),
        }
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn decode_bytes(&self) -> Result<Vec<u8>, GenerationError> {
        general_purpose::STANDARD
            .decode(self.data.trim())
            .map_err(|err| GenerationError::InvalidImage(format!("result is not base64: {err}")))
    }

    pub fn file_extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }

    pub fn file_name(&self, mode_slug: &str) -> String {
        format!(
            "twitchmote-ai-{}-{}.{}",
            mode_slug,
            self.created_at.timestamp_millis(),
            self.file_extension()
        )
    }
}

/// One instruction plus one reference image in, one image out.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    fn model(&self) -> &str;

    async fn generate(
        &self,
        instruction: &str,
        image: &ImagePayload,
    ) -> Result<GeneratedImage, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn builds_data_uri_from_reported_mime() {
        let image = GeneratedImage::new("image/webp", "UklGRg==");
        assert_eq!(image.data_uri(), "data:image/webp;base64,UklGRg==");
        assert_eq!(image.decode_bytes().unwrap(), b"RIFF".to_vec());
    }

    #[test]
    fn names_downloads_by_mode_and_timestamp() {
        let mut image = GeneratedImage::new("image/png", "");
        image.created_at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            image.file_name("remove-bg"),
            "twitchmote-ai-remove-bg-1700000000123.png"
        );
    }

    #[test]
    fn status_and_transport_are_transport_failures() {
        assert!(GenerationError::Transport("boom".into()).is_transport());
        assert!(GenerationError::Status {
            status: 429,
            detail: "quota".into()
        }
        .is_transport());
        assert!(!GenerationError::EmptyResponse.is_transport());
    }
}
