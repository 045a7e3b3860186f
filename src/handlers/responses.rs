use std::time::Duration;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::warn;

use crate::studio::options::{BackgroundOption, EmoteEmotion, EmoteStyle, PortraitStyle};
use crate::studio::session::{GenerationStatus, SessionState, SkipReason, StudioMode};

pub const HELP_TEXT: &str = "TwitchMote AI

Send a photo, pick a mode and options, then /generate.

/mode <emote|portrait|background> - Switch the transformation mode
/style <id> - Pick the emote or portrait style for the current mode
/emotion <id> - Pick the emote emotion
/background <id> - Pick the replacement background
/note <text> - Extra instructions for the current mode (empty clears)
/options - List the choices for the current mode
/settings - Show the current selections
/clear - Forget the stored photo
/generate [note] - Generate from your last photo, or reply to a photo";

pub async fn edit_text_with_retry(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    text: &str,
) -> Result<()> {
    let mut delay = Duration::from_secs_f32(1.5);
    for attempt in 0..3 {
        match bot
            .edit_message_text(chat_id, message_id, text.to_string())
            .await
        {
            Ok(_) => return Ok(()),
            Err(err) => {
                if attempt == 2 {
                    return Err(err.into());
                }
                warn!("edit_message_text failed: {err}");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }

    Ok(())
}

fn push_catalog<T: Copy>(
    text: &mut String,
    title: &str,
    entries: &[T],
    id: impl Fn(T) -> &'static str,
    label: impl Fn(T) -> &'static str,
) {
    text.push_str(title);
    text.push('\n');
    for entry in entries {
        text.push_str(&format!("  {} - {}\n", id(*entry), label(*entry)));
    }
}

pub fn format_options(mode: StudioMode) -> String {
    let mut text = format!("Options for {}:\n\n", mode.label());
    match mode {
        StudioMode::Emote => {
            push_catalog(&mut text, "Styles (/style):", &EmoteStyle::ALL, |s| s.id(), |s| s.label());
            text.push('\n');
            push_catalog(
                &mut text,
                "Emotions (/emotion):",
                &EmoteEmotion::ALL,
                |e| e.id(),
                |e| e.label(),
            );
        }
        StudioMode::Portrait => push_catalog(
            &mut text,
            "Styles (/style):",
            &PortraitStyle::ALL,
            |s| s.id(),
            |s| s.label(),
        ),
        StudioMode::Background => push_catalog(
            &mut text,
            "Backgrounds (/background):",
            &BackgroundOption::ALL,
            |b| b.id(),
            |b| b.label(),
        ),
    }
    text.trim_end().to_string()
}

pub fn format_all_options() -> String {
    StudioMode::ALL
        .iter()
        .map(|mode| format_options(*mode))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn format_settings(state: &SessionState) -> String {
    let mut text = format!("Mode: {}\n", state.mode.label());
    match state.mode {
        StudioMode::Emote => {
            text.push_str(&format!("Style: {}\n", state.emote.style.label()));
            text.push_str(&format!("Emotion: {}\n", state.emote.emotion.label()));
        }
        StudioMode::Portrait => {
            text.push_str(&format!("Style: {}\n", state.portrait.style.label()));
        }
        StudioMode::Background => {
            text.push_str(&format!("Background: {}\n", state.background.background.label()));
        }
    }

    let note = state.annotation();
    text.push_str(&format!(
        "Note: {}\n",
        if note.is_empty() { "(none)" } else { note }
    ));
    text.push_str(&format!(
        "Photo: {}\n",
        if state.input_image.is_some() { "ready" } else { "not set" }
    ));
    let status = match &state.status {
        GenerationStatus::Idle => "idle".to_string(),
        GenerationStatus::Generating => "generating".to_string(),
        GenerationStatus::Succeeded(result) => format!("done ({})", result.file_name()),
        GenerationStatus::Failed(message) => format!("failed: {message}"),
    };
    text.push_str(&format!("Status: {status}"));
    text
}

pub fn skip_reason_text(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::NoImage => "Send a photo first, or reply to a photo with /generate.",
        SkipReason::AlreadyGenerating => "Still working on your previous image. Please wait.",
    }
}

pub fn unknown_option_text(kind: &str, value: &str, valid: &[&'static str]) -> String {
    format!(
        "Unknown {kind} '{}'. Valid choices: {}",
        value.trim(),
        valid.join(", ")
    )
}

pub fn generating_status_text(mode: StudioMode) -> &'static str {
    match mode {
        StudioMode::Emote => "Generating your emote...",
        StudioMode::Portrait => "Drawing your portrait...",
        StudioMode::Background => "Replacing the background...",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emote_options_list_styles_and_emotions() {
        let text = format_options(StudioMode::Emote);
        assert!(text.contains("none - None / Custom"));
        assert!(text.contains("shocked - Shocked / Pog"));
        assert!(!text.contains("chroma"));
    }

    #[test]
    fn all_options_cover_every_mode() {
        let text = format_all_options();
        assert!(text.contains("oil_painting - Classic Oil Painting"));
        assert!(text.contains("green - Green Screen (Chroma Key)"));
    }

    #[test]
    fn settings_show_the_active_mode_selection() {
        let mut state = SessionState::default();
        state.mode = StudioMode::Background;
        state.background.annotation = "keep the hat".to_string();
        let text = format_settings(&state);
        assert!(text.contains("Mode: Remove Background"));
        assert!(text.contains("Background: Transparent Background (AI attempt)"));
        assert!(text.contains("Note: keep the hat"));
        assert!(text.contains("Photo: not set"));
        assert!(text.ends_with("Status: idle"));
    }

    #[test]
    fn unknown_option_lists_valid_ids() {
        let text = unknown_option_text("emotion", " pog ", &["hype", "sad"]);
        assert_eq!(text, "Unknown emotion 'pog'. Valid choices: hype, sad");
    }
}
