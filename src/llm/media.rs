use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use reqwest::StatusCode;
use tracing::{error, warn};

use crate::llm::types::GenerationError;
use crate::utils::http::get_http_client;

/// Tag used when neither a data-URI header nor the bytes reveal the format.
pub const FALLBACK_IMAGE_MIME: &str = "image/jpeg";

pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    if data.len() > 12 {
        let ftyp = &data[4..12];
        if ftyp.starts_with(b"ftyp") {
            let brand = &ftyp[4..8];
            if brand == b"heic" || brand == b"heif" || brand == b"hevc" {
                return Some("image/heic".to_string());
            }
        }
    }

    infer::get(data).map(|kind| kind.mime_type().to_string())
}

pub fn normalize_image_mime_type(mime_type: &str) -> String {
    let lowered = mime_type.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        "image/x-png" => "image/png".to_string(),
        _ => lowered,
    }
}

/// An input image in the form the generation service expects: a mime tag and
/// a bare base64 payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: String,
}

impl ImagePayload {
    /// Accepts either a bare base64 string or a `data:<mime>;base64,<data>`
    /// URI. Both spellings of the same image normalize to the same payload.
    pub fn parse(input: &str) -> Result<Self, GenerationError> {
        let trimmed = input.trim();
        let (declared_mime, data) = match trimmed.strip_prefix("data:") {
            Some(rest) => {
                let (header, data) = rest.split_once(',').ok_or_else(|| {
                    GenerationError::InvalidImage("data URI has no payload".to_string())
                })?;
                let mime = header.split(';').next().unwrap_or_default().trim();
                let mime = if mime.is_empty() { None } else { Some(mime) };
                (mime, data.trim())
            }
            None => (None, trimmed),
        };

        if data.is_empty() {
            return Err(GenerationError::InvalidImage("image payload is empty".to_string()));
        }

        let bytes = general_purpose::STANDARD
            .decode(data)
            .map_err(|err| GenerationError::InvalidImage(format!("payload is not base64: {err}")))?;

        // Sniffed bytes beat the declared header; non-image tags are ignored.
        let mime_type = detect_mime_type(&bytes)
            .map(|mime| normalize_image_mime_type(&mime))
            .filter(|mime| mime.starts_with("image/"))
            .or_else(|| {
                declared_mime
                    .map(normalize_image_mime_type)
                    .filter(|mime| mime.starts_with("image/"))
            })
            .unwrap_or_else(|| FALLBACK_IMAGE_MIME.to_string());

        Ok(Self {
            mime_type,
            data: data.to_string(),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GenerationError> {
        if bytes.is_empty() {
            return Err(GenerationError::InvalidImage("image file is empty".to_string()));
        }
        let mime_type = detect_mime_type(bytes)
            .map(|mime| normalize_image_mime_type(&mime))
            .unwrap_or_else(|| FALLBACK_IMAGE_MIME.to_string());
        if !mime_type.starts_with("image/") {
            return Err(GenerationError::InvalidImage(format!(
                "expected an image, got {mime_type}"
            )));
        }
        Ok(Self {
            mime_type,
            data: general_purpose::STANDARD.encode(bytes),
        })
    }
}

const MEDIA_DOWNLOAD_MAX_ATTEMPTS: usize = 3;
const MEDIA_DOWNLOAD_BASE_DELAY_MS: u64 = 400;
const MEDIA_DOWNLOAD_ERROR_BODY_LIMIT: usize = 800;

pub(crate) fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn should_retry_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Fetches an uploaded photo (e.g. a Telegram file URL).
pub async fn download_media(url: &str) -> Option<Vec<u8>> {
    let client = get_http_client();
    for attempt in 0..MEDIA_DOWNLOAD_MAX_ATTEMPTS {
        let response = match client.get(url).send().await {
            Ok(resp) => resp,
            Err(err) => {
                let retryable = should_retry_error(&err);
                // Telegram file URLs embed the bot token.
                let err = err.without_url();
                warn!(
                    "Failed to fetch media: {} (timeout={}, connect={}, attempt={}/{})",
                    err,
                    err.is_timeout(),
                    err.is_connect(),
                    attempt + 1,
                    MEDIA_DOWNLOAD_MAX_ATTEMPTS
                );
                if !retryable || attempt + 1 == MEDIA_DOWNLOAD_MAX_ATTEMPTS {
                    return None;
                }
                let delay = Duration::from_millis(MEDIA_DOWNLOAD_BASE_DELAY_MS << attempt);
                tokio::time::sleep(delay).await;
                continue;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(
                "Media download failed with status {}: {}",
                status,
                truncate_for_log(&body, MEDIA_DOWNLOAD_ERROR_BODY_LIMIT)
            );
            if !should_retry_status(status) || attempt + 1 == MEDIA_DOWNLOAD_MAX_ATTEMPTS {
                return None;
            }
            let delay = Duration::from_millis(MEDIA_DOWNLOAD_BASE_DELAY_MS << attempt);
            tokio::time::sleep(delay).await;
            continue;
        }

        return match response.bytes().await {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(err) => {
                error!(
                    "Failed to read media bytes: {} (attempt={}/{})",
                    err.without_url(),
                    attempt + 1,
                    MEDIA_DOWNLOAD_MAX_ATTEMPTS
                );
                if attempt + 1 == MEDIA_DOWNLOAD_MAX_ATTEMPTS {
                    None
                } else {
                    let delay = Duration::from_millis(MEDIA_DOWNLOAD_BASE_DELAY_MS << attempt);
                    tokio::time::sleep(delay).await;
                    continue;
                }
            }
        };
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[
        0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, b'I', b'H', b'D', b'R',
    ];

    #[test]
    fn data_uri_and_bare_payload_normalize_identically() {
        let bare = general_purpose::STANDARD.encode(PNG_HEADER);
        let prefixed = format!("data:image/png;base64,{bare}");

        let from_bare = ImagePayload::parse(&bare).unwrap();
        let from_uri = ImagePayload::parse(&prefixed).unwrap();

        assert_eq!(from_bare, from_uri);
        assert_eq!(from_uri.data, bare);
        assert_eq!(from_uri.mime_type, "image/png");
    }

    #[test]
    fn sniffed_bytes_override_a_misleading_header() {
        let bare = general_purpose::STANDARD.encode(PNG_HEADER);
        let from_bare = ImagePayload::parse(&bare).unwrap();

        let octet = ImagePayload::parse(&format!("data:application/octet-stream;base64,{bare}"))
            .unwrap();
        let mismatched = ImagePayload::parse(&format!("data:image/jpeg;base64,{bare}")).unwrap();

        assert_eq!(octet, from_bare);
        assert_eq!(mismatched, from_bare);
        assert_eq!(octet.mime_type, "image/png");
    }

    #[test]
    fn non_image_header_on_unknown_bytes_falls_back_to_jpeg() {
        let payload = ImagePayload::parse("data:text/plain;base64,AAAA").unwrap();
        assert_eq!(payload.mime_type, FALLBACK_IMAGE_MIME);
    }

    #[test]
    fn declared_mime_aliases_are_normalized() {
        let payload = ImagePayload::parse("data:image/JPG;base64,AAAA").unwrap();
        assert_eq!(payload.mime_type, "image/jpeg");
    }

    #[test]
    fn unknown_bare_bytes_fall_back_to_jpeg() {
        let payload = ImagePayload::parse("AAAA").unwrap();
        assert_eq!(payload.mime_type, FALLBACK_IMAGE_MIME);
    }

    #[test]
    fn rejects_empty_and_malformed_payloads() {
        assert!(matches!(
            ImagePayload::parse("data:image/png;base64,"),
            Err(GenerationError::InvalidImage(_))
        ));
        assert!(matches!(
            ImagePayload::parse("not base64!"),
            Err(GenerationError::InvalidImage(_))
        ));
        assert!(matches!(
            ImagePayload::parse("data:image/png;base64"),
            Err(GenerationError::InvalidImage(_))
        ));
    }

    #[test]
    fn from_bytes_sniffs_the_format() {
        let payload = ImagePayload::from_bytes(PNG_HEADER).unwrap();
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(
            ImagePayload::parse(&payload.data).unwrap(),
            payload
        );
        assert!(ImagePayload::from_bytes(&[]).is_err());
    }
}
