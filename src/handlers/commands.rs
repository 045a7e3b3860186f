use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ReplyParameters};
use tracing::{error, info, warn};

use crate::handlers::media::{fetch_image_payload, find_image_file_id, image_file_id};
use crate::handlers::responses::{
    edit_text_with_retry, format_options, format_settings, generating_status_text,
    skip_reason_text, unknown_option_text, HELP_TEXT,
};
use crate::state::AppState;
use crate::studio::options::{BackgroundOption, EmoteEmotion, EmoteStyle, PortraitStyle};
use crate::studio::session::{
    SkipReason, StudioMode, SubmitOutcome, GENERATION_FAILED_MESSAGE,
};
use crate::utils::telegram::start_upload_indicator;
use crate::utils::timing::start_command_timer;

async fn reply(bot: &Bot, message: &Message, text: impl Into<String>) -> Result<()> {
    bot.send_message(message.chat.id, text.into())
        .reply_parameters(ReplyParameters::new(message.id))
        .await?;
    Ok(())
}

pub async fn start_handler(bot: Bot, message: Message) -> Result<()> {
    reply(
        &bot,
        &message,
        "Hi! Send me a photo and I'll turn it into a Twitch emote, a stylized portrait, or swap its background. Use /help to see commands.",
    )
    .await
}

pub async fn help_handler(bot: Bot, message: Message) -> Result<()> {
    reply(&bot, &message, HELP_TEXT).await
}

pub async fn mode_handler(bot: Bot, state: AppState, message: Message, arg: String) -> Result<()> {
    let studio = state.studio_for(message.chat.id);
    let Some(mode) = StudioMode::from_id(&arg) else {
        let valid: Vec<&'static str> = StudioMode::ALL.iter().map(|mode| mode.id()).collect();
        return reply(&bot, &message, unknown_option_text("mode", &arg, &valid)).await;
    };

    studio.set_mode(mode);
    reply(
        &bot,
        &message,
        format!("Mode set to {}.\n\n{}", mode.label(), format_options(mode)),
    )
    .await
}

pub async fn style_handler(bot: Bot, state: AppState, message: Message, arg: String) -> Result<()> {
    let studio = state.studio_for(message.chat.id);
    let mode = studio.snapshot().mode;
    let text = match mode {
        StudioMode::Emote => match EmoteStyle::from_id(&arg) {
            Some(style) => {
                studio.set_emote_style(style);
                format!("Emote style set to {}.", style.label())
            }
            None => {
                let valid: Vec<_> = EmoteStyle::ALL.iter().map(|style| style.id()).collect();
                unknown_option_text("emote style", &arg, &valid)
            }
        },
        StudioMode::Portrait => match PortraitStyle::from_id(&arg) {
            Some(style) => {
                studio.set_portrait_style(style);
                format!("Portrait style set to {}.", style.label())
            }
            None => {
                let valid: Vec<_> = PortraitStyle::ALL.iter().map(|style| style.id()).collect();
                unknown_option_text("portrait style", &arg, &valid)
            }
        },
        StudioMode::Background => {
            "Background mode has no styles. Use /background <id> instead.".to_string()
        }
    };
    reply(&bot, &message, text).await
}

pub async fn emotion_handler(
    bot: Bot,
    state: AppState,
    message: Message,
    arg: String,
) -> Result<()> {
    let studio = state.studio_for(message.chat.id);
    let text = match EmoteEmotion::from_id(&arg) {
        Some(emotion) => {
            studio.set_emotion(emotion);
            format!("Emotion set to {}.", emotion.label())
        }
        None => {
            let valid: Vec<_> = EmoteEmotion::ALL.iter().map(|emotion| emotion.id()).collect();
            unknown_option_text("emotion", &arg, &valid)
        }
    };
    reply(&bot, &message, text).await
}

pub async fn background_handler(
    bot: Bot,
    state: AppState,
    message: Message,
    arg: String,
) -> Result<()> {
    let studio = state.studio_for(message.chat.id);
    let text = match BackgroundOption::from_id(&arg) {
        Some(background) => {
            studio.set_background(background);
            format!("Background set to {}.", background.label())
        }
        None => {
            let valid: Vec<_> = BackgroundOption::ALL.iter().map(|option| option.id()).collect();
            unknown_option_text("background", &arg, &valid)
        }
    };
    reply(&bot, &message, text).await
}

pub async fn note_handler(bot: Bot, state: AppState, message: Message, arg: String) -> Result<()> {
    let studio = state.studio_for(message.chat.id);
    let note = arg.trim().to_string();
    let cleared = note.is_empty();
    studio.set_annotation(note);
    let mode = studio.snapshot().mode;
    let text = if cleared {
        format!("Cleared the note for {}.", mode.label())
    } else {
        format!("Saved the note for {}.", mode.label())
    };
    reply(&bot, &message, text).await
}

pub async fn options_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let mode = state.studio_for(message.chat.id).snapshot().mode;
    reply(&bot, &message, format_options(mode)).await
}

pub async fn settings_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let snapshot = state.studio_for(message.chat.id).snapshot();
    reply(&bot, &message, format_settings(&snapshot)).await
}

pub async fn clear_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    state.studio_for(message.chat.id).clear_input_image();
    reply(&bot, &message, "Forgot your photo. Send a new one to continue.").await
}

/// Stores a photo (or image document) as the chat's input image.
pub async fn photo_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let Some(file_id) = image_file_id(&message) else {
        return Ok(());
    };

    match fetch_image_payload(&bot, &file_id).await {
        Ok(image) => {
            info!(
                chat_id = message.chat.id.0,
                mime = %image.mime_type,
                "Stored input image"
            );
            state.studio_for(message.chat.id).set_input_image(image);
            reply(&bot, &message, "Got your photo! Use /generate when you're ready.").await
        }
        Err(err) => {
            warn!("Failed to load photo: {err}");
            reply(&bot, &message, "I couldn't read that image. Please try another one.").await
        }
    }
}

pub async fn generate_handler(
    bot: Bot,
    state: AppState,
    message: Message,
    note: Option<String>,
) -> Result<()> {
    let studio = state.studio_for(message.chat.id);

    if let Some(note) = note {
        studio.set_annotation(note);
    }

    if let Some(file_id) = find_image_file_id(&message) {
        match fetch_image_payload(&bot, &file_id).await {
            Ok(image) => studio.set_input_image(image),
            Err(err) => warn!("Failed to load replied photo: {err}"),
        }
    }

    let snapshot = studio.snapshot();
    let mut timer = start_command_timer("generate", snapshot.mode.id(), &message);

    let skip = if snapshot.input_image.is_none() {
        Some(SkipReason::NoImage)
    } else if snapshot.is_generating() {
        Some(SkipReason::AlreadyGenerating)
    } else {
        None
    };
    if let Some(reason) = skip {
        timer.mark_status("skipped", Some(format!("{reason:?}")));
        return reply(&bot, &message, skip_reason_text(reason)).await;
    }

    let status_message = bot
        .send_message(message.chat.id, generating_status_text(snapshot.mode))
        .reply_parameters(ReplyParameters::new(message.id))
        .await?;
    let upload_indicator = start_upload_indicator(bot.clone(), message.chat.id);
    let outcome = studio.submit().await;
    upload_indicator.stop();

    match outcome {
        SubmitOutcome::Completed(result) => {
            let bytes = match result.image.decode_bytes() {
                Ok(bytes) => bytes,
                Err(err) => {
                    error!("Generated image could not be decoded: {err}");
                    timer.mark_status("error", Some(err.to_string()));
                    edit_text_with_retry(
                        &bot,
                        message.chat.id,
                        status_message.id,
                        GENERATION_FAILED_MESSAGE,
                    )
                    .await?;
                    return Ok(());
                }
            };

            let file_name = result.file_name();
            bot.send_document(message.chat.id, InputFile::memory(bytes).file_name(file_name.clone()))
                .caption(format!("{} ({})", result.mode.label(), studio.generator_model()))
                .reply_parameters(ReplyParameters::new(message.id))
                .await?;
            if let Err(err) =
                edit_text_with_retry(&bot, message.chat.id, status_message.id, "Done!").await
            {
                warn!("Failed to mark generation status as done: {err}");
            }
            timer.mark_status("success", Some(file_name));
        }
        SubmitOutcome::Failed(user_message) => {
            timer.mark_status("error", None);
            edit_text_with_retry(&bot, message.chat.id, status_message.id, &user_message).await?;
        }
        SubmitOutcome::Skipped(reason) => {
            timer.mark_status("skipped", Some(format!("{reason:?}")));
            edit_text_with_retry(
                &bot,
                message.chat.id,
                status_message.id,
                skip_reason_text(reason),
            )
            .await?;
        }
    }

    Ok(())
}
