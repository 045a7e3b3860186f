use anyhow::{anyhow, Result};
use teloxide::prelude::*;
use teloxide::types::FileId;
use tracing::warn;

use crate::config::CONFIG;
use crate::llm::media::{download_media, ImagePayload};

pub async fn get_file_url(bot: &Bot, file_id: &FileId) -> Result<String> {
    let file = bot.get_file(file_id.clone()).await?;
    Ok(format!(
        "https://api.telegram.org/file/bot{}/{}",
        CONFIG.bot_token, file.path
    ))
}

/// The largest photo size, or an image sent as a document.
pub fn image_file_id(message: &Message) -> Option<FileId> {
    if let Some(photo) = message.photo().and_then(|sizes| sizes.last()) {
        return Some(photo.file.id.clone());
    }

    let document = message.document()?;
    let is_image = document
        .mime_type
        .as_ref()
        .map(|mime| mime.to_string().starts_with("image/"))
        .unwrap_or(false);
    is_image.then(|| document.file.id.clone())
}

/// Prefers an image on the message itself, then on the message it replies to.
pub fn find_image_file_id(message: &Message) -> Option<FileId> {
    image_file_id(message).or_else(|| message.reply_to_message().and_then(image_file_id))
}

pub async fn fetch_image_payload(bot: &Bot, file_id: &FileId) -> Result<ImagePayload> {
    let url = get_file_url(bot, file_id).await?;
    let Some(bytes) = download_media(&url).await else {
        warn!("Could not download Telegram image {:?}", file_id);
        return Err(anyhow!("could not download the image from Telegram"));
    };
    Ok(ImagePayload::from_bytes(&bytes)?)
}
