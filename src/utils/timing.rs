use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use teloxide::types::Message;
use tracing::info;

#[derive(Debug)]
pub struct CommandTimer {
    command: String,
    chat_id: i64,
    user_id: Option<i64>,
    mode: Option<String>,
    started_at: DateTime<Utc>,
    started_perf: Instant,
    status: String,
    detail: Option<String>,
    completed: bool,
}

impl CommandTimer {
    pub fn from_message(command: &str, message: &Message) -> Self {
        let user = message.from.as_ref();
        CommandTimer {
            command: command.to_string(),
            chat_id: message.chat.id.0,
            user_id: user.and_then(|u| i64::try_from(u.id.0).ok()),
            mode: None,
            started_at: Utc::now(),
            started_perf: Instant::now(),
            status: "success".to_string(),
            detail: None,
            completed: false,
        }
    }

    pub fn with_mode(mut self, mode: &str) -> Self {
        self.mode = Some(mode.to_string());
        self
    }

    pub fn log_received(&self) {
        info!(
            target: "bot.timing",
            "event=command_received command={} chat_id={} user_id={:?} mode={:?} received_at={}",
            self.command,
            self.chat_id,
            self.user_id,
            self.mode,
            self.started_at.to_rfc3339()
        );
    }

    pub fn mark_status(&mut self, status: &str, detail: Option<String>) {
        self.status = status.to_string();
        self.detail = detail;
    }

    pub fn log_completed(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        let completed_at = Utc::now();
        let duration = self.started_perf.elapsed().as_secs_f64();
        info!(
            target: "bot.timing",
            "event=command_completed command={} chat_id={} user_id={:?} mode={:?} started_at={} response_sent_at={} duration_s={:.3} status={} detail={}",
            self.command,
            self.chat_id,
            self.user_id,
            self.mode,
            self.started_at.to_rfc3339(),
            completed_at.to_rfc3339(),
            duration,
            self.status,
            self.detail.clone().unwrap_or_default()
        );
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        self.log_completed();
    }
}

pub fn start_command_timer(command: &str, mode: &str, message: &Message) -> CommandTimer {
    let timer = CommandTimer::from_message(command, message).with_mode(mode);
    timer.log_received();
    timer
}

pub async fn log_llm_timing<T, E, F, Fut>(
    provider: &str,
    model: &str,
    operation: &str,
    metadata: Option<JsonValue>,
    call: F,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let started_at = Utc::now();
    let started_perf = Instant::now();
    let metadata_text = metadata
        .as_ref()
        .map(|value| value.to_string())
        .unwrap_or_else(|| "{}".to_string());
    info!(
        target: "bot.timing",
        "event=llm_request provider={} model={} operation={} started_at={} metadata={}",
        provider,
        model,
        operation,
        started_at.to_rfc3339(),
        metadata_text
    );

    let result = call().await;
    let status = if result.is_ok() { "success" } else { "error" };

    let duration = started_perf.elapsed().as_secs_f64();
    info!(
        target: "bot.timing",
        "event=llm_response provider={} model={} operation={} completed_at={} duration_s={:.3} status={} metadata={}",
        provider,
        model,
        operation,
        Utc::now().to_rfc3339(),
        duration,
        status,
        metadata_text
    );

    result
}
