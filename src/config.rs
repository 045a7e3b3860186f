use std::env;
use std::path::PathBuf;

use anyhow::Result;
use once_cell::sync::Lazy;
use tracing::warn;

pub const DEFAULT_GEMINI_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub log_level: String,
    pub gemini_api_key: String,
    pub gemini_image_model: String,
    pub gemini_api_base_url: String,
    pub gemini_safety_settings: String,
    pub gemini_request_timeout_seconds: u64,
    pub gemini_max_attempts: usize,
    pub output_dir: PathBuf,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

fn env_string(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn normalize_gemini_safety_settings(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "permissive".to_string();
    }

    let lowered = trimmed.to_lowercase();
    match lowered.as_str() {
        "permissive" | "off" | "none" => "permissive".to_string(),
        "standard" => "standard".to_string(),
        _ => {
            warn!(
                "Unknown GEMINI_SAFETY_SETTINGS value '{}'; defaulting to permissive.",
                value
            );
            "permissive".to_string()
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let gemini_request_timeout_seconds = env_u64("GEMINI_REQUEST_TIMEOUT_SECONDS", 90).max(1);
        let gemini_max_attempts = env_usize("GEMINI_MAX_ATTEMPTS", 2).clamp(1, 2);

        Ok(Config {
            bot_token: env_string("BOT_TOKEN", ""),
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            gemini_api_key: env_string("GEMINI_API_KEY", ""),
            gemini_image_model: env_string("GEMINI_IMAGE_MODEL", DEFAULT_GEMINI_IMAGE_MODEL),
            gemini_api_base_url: env_string("GEMINI_API_BASE_URL", DEFAULT_GEMINI_API_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            gemini_safety_settings: normalize_gemini_safety_settings(env_string(
                "GEMINI_SAFETY_SETTINGS",
                "permissive",
            )),
            gemini_request_timeout_seconds,
            gemini_max_attempts,
            output_dir: PathBuf::from(env_string("OUTPUT_DIR", "output")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safety_settings_accept_aliases() {
        assert_eq!(normalize_gemini_safety_settings("OFF".into()), "permissive");
        assert_eq!(normalize_gemini_safety_settings(" Standard ".into()), "standard");
        assert_eq!(normalize_gemini_safety_settings("strict".into()), "permissive");
        assert_eq!(normalize_gemini_safety_settings(String::new()), "permissive");
    }

    #[test]
    fn numeric_helpers_fall_back_on_garbage() {
        env::set_var("TWITCHMOTE_TEST_GARBAGE_U64", "ninety");
        assert_eq!(env_u64("TWITCHMOTE_TEST_GARBAGE_U64", 90), 90);
        env::set_var("TWITCHMOTE_TEST_GARBAGE_USIZE", " 3 ");
        assert_eq!(env_usize("TWITCHMOTE_TEST_GARBAGE_USIZE", 2), 3);
        assert_eq!(env_string("TWITCHMOTE_TEST_MISSING", "fallback"), "fallback");
    }
}
