use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::ChatAction;
use tokio::task::JoinHandle;
use tracing::debug;

// Telegram clears a chat action after roughly five seconds.
const UPLOAD_ACTION_INTERVAL: Duration = Duration::from_secs(4);

/// Repeats a chat action ("sending a file...") while a generation runs.
/// Stops when dropped.
pub struct UploadIndicator {
    task_handle: Option<JoinHandle<()>>,
}

impl UploadIndicator {
    pub fn stop(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

impl Drop for UploadIndicator {
    fn drop(&mut self) {
        self.abort();
    }
}

pub fn start_upload_indicator(bot: Bot, chat_id: ChatId) -> UploadIndicator {
    let task_handle = tokio::spawn(async move {
        loop {
            if let Err(err) = bot
                .send_chat_action(chat_id, ChatAction::UploadDocument)
                .await
            {
                debug!("send_chat_action failed for chat {}: {err}", chat_id.0);
            }
            tokio::time::sleep(UPLOAD_ACTION_INTERVAL).await;
        }
    });

    UploadIndicator {
        task_handle: Some(task_handle),
    }
}
