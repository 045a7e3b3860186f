use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::llm::media::ImagePayload;
use crate::llm::types::{GeneratedImage, ImageGenerator};
use crate::studio::options::{BackgroundOption, EmoteEmotion, EmoteStyle, PortraitStyle};
use crate::studio::prompts::{build_background_prompt, build_emote_prompt, build_portrait_prompt};

pub const GENERATION_FAILED_MESSAGE: &str =
    "There was an error generating your image. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StudioMode {
    #[default]
    Emote,
    Portrait,
    Background,
}

impl StudioMode {
    pub const ALL: [StudioMode; 3] = [StudioMode::Emote, StudioMode::Portrait, StudioMode::Background];

    pub fn id(self) -> &'static str {
        match self {
            StudioMode::Emote => "emote",
            StudioMode::Portrait => "portrait",
            StudioMode::Background => "background",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StudioMode::Emote => "Emote Generator",
            StudioMode::Portrait => "Your Drawn Version",
            StudioMode::Background => "Remove Background",
        }
    }

    /// Used in result file names.
    pub fn slug(self) -> &'static str {
        match self {
            StudioMode::Emote => "emote",
            StudioMode::Portrait => "portrait",
            StudioMode::Background => "remove-bg",
        }
    }

    pub fn from_id(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "emote" | "emotes" => Some(StudioMode::Emote),
            "portrait" | "drawing" => Some(StudioMode::Portrait),
            "background" | "bg" | "remove-bg" | "remove_bg" => Some(StudioMode::Background),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmoteSettings {
    pub style: EmoteStyle,
    pub emotion: EmoteEmotion,
    pub annotation: String,
}

impl Default for EmoteSettings {
    fn default() -> Self {
        Self {
            style: EmoteStyle::Cartoon,
            emotion: EmoteEmotion::Hype,
            annotation: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortraitSettings {
    pub style: PortraitStyle,
    pub annotation: String,
}

impl Default for PortraitSettings {
    fn default() -> Self {
        Self {
            style: PortraitStyle::Disney3d,
            annotation: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundSettings {
    pub background: BackgroundOption,
    pub annotation: String,
}

impl Default for BackgroundSettings {
    fn default() -> Self {
        Self {
            background: BackgroundOption::Transparent,
            annotation: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioResult {
    /// Mode the request was composed for; may differ from the active mode if
    /// the user switched while it was in flight.
    pub mode: StudioMode,
    pub image: GeneratedImage,
}

impl StudioResult {
    pub fn file_name(&self) -> String {
        self.image.file_name(self.mode.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenerationStatus {
    #[default]
    Idle,
    Generating,
    Succeeded(StudioResult),
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub mode: StudioMode,
    pub emote: EmoteSettings,
    pub portrait: PortraitSettings,
    pub background: BackgroundSettings,
    pub input_image: Option<ImagePayload>,
    pub status: GenerationStatus,
}

impl SessionState {
    pub fn is_generating(&self) -> bool {
        self.status == GenerationStatus::Generating
    }

    pub fn annotation(&self) -> &str {
        match self.mode {
            StudioMode::Emote => &self.emote.annotation,
            StudioMode::Portrait => &self.portrait.annotation,
            StudioMode::Background => &self.background.annotation,
        }
    }

    pub fn compose_instruction(&self) -> String {
        match self.mode {
            StudioMode::Emote => {
                build_emote_prompt(self.emote.style, self.emote.emotion, &self.emote.annotation)
            }
            StudioMode::Portrait => {
                build_portrait_prompt(self.portrait.style, &self.portrait.annotation)
            }
            StudioMode::Background => {
                build_background_prompt(self.background.background, &self.background.annotation)
            }
        }
    }

    fn build_request(&self) -> Option<GenerationRequest> {
        let image = self.input_image.clone()?;
        Some(GenerationRequest {
            mode: self.mode,
            instruction: self.compose_instruction(),
            image,
        })
    }
}

/// Snapshot of one submission; never mutated after dispatch.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub mode: StudioMode,
    pub instruction: String,
    pub image: ImagePayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoImage,
    AlreadyGenerating,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Skipped(SkipReason),
    Completed(StudioResult),
    Failed(String),
}

/// Marks an in-flight request as failed if `submit` is dropped (or the
/// generator panics) before the outcome is recorded.
struct InFlightGuard<'a> {
    state: &'a Mutex<SessionState>,
    armed: bool,
}

impl InFlightGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock();
        if state.is_generating() {
            warn!("Generation request abandoned before completion");
            state.status = GenerationStatus::Failed(GENERATION_FAILED_MESSAGE.to_string());
        }
    }
}

/// Session-scoped orchestrator: holds the active mode, per-mode options and
/// the last outcome, and dispatches at most one request at a time.
pub struct Studio {
    generator: Arc<dyn ImageGenerator>,
    state: Mutex<SessionState>,
}

impl Studio {
    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        Self {
            generator,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.lock().clone()
    }

    pub fn generator_model(&self) -> &str {
        self.generator.model()
    }

    /// Switching modes keeps option selections but clears the shown outcome.
    /// An in-flight request keeps its `Generating` status.
    pub fn set_mode(&self, mode: StudioMode) {
        let mut state = self.state.lock();
        state.mode = mode;
        if !state.is_generating() {
            state.status = GenerationStatus::Idle;
        }
    }

    pub fn set_input_image(&self, image: ImagePayload) {
        self.state.lock().input_image = Some(image);
    }

    pub fn clear_input_image(&self) {
        self.state.lock().input_image = None;
    }

    pub fn set_emote_style(&self, style: EmoteStyle) {
        self.state.lock().emote.style = style;
    }

    pub fn set_emotion(&self, emotion: EmoteEmotion) {
        self.state.lock().emote.emotion = emotion;
    }

    pub fn set_portrait_style(&self, style: PortraitStyle) {
        self.state.lock().portrait.style = style;
    }

    pub fn set_background(&self, background: BackgroundOption) {
        self.state.lock().background.background = background;
    }

    /// Sets the free-text annotation of the active mode.
    pub fn set_annotation(&self, annotation: impl Into<String>) {
        let annotation = annotation.into();
        let mut state = self.state.lock();
        match state.mode {
            StudioMode::Emote => state.emote.annotation = annotation,
            StudioMode::Portrait => state.portrait.annotation = annotation,
            StudioMode::Background => state.background.annotation = annotation,
        }
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let request = {
            let mut state = self.state.lock();
            if state.is_generating() {
                return SubmitOutcome::Skipped(SkipReason::AlreadyGenerating);
            }
            let Some(request) = state.build_request() else {
                return SubmitOutcome::Skipped(SkipReason::NoImage);
            };
            state.status = GenerationStatus::Generating;
            request
        };
        let guard = InFlightGuard {
            state: &self.state,
            armed: true,
        };

        info!(
            mode = request.mode.id(),
            model = self.generator.model(),
            image_mime = %request.image.mime_type,
            "Submitting generation request"
        );

        let result = self
            .generator
            .generate(&request.instruction, &request.image)
            .await;
        guard.disarm();

        let mut state = self.state.lock();
        match result {
            Ok(image) => {
                let result = StudioResult {
                    mode: request.mode,
                    image,
                };
                state.status = GenerationStatus::Succeeded(result.clone());
                SubmitOutcome::Completed(result)
            }
            Err(err) => {
                error!(
                    mode = request.mode.id(),
                    transport = err.is_transport(),
                    "Image generation failed: {}",
                    err
                );
                state.status = GenerationStatus::Failed(GENERATION_FAILED_MESSAGE.to_string());
                SubmitOutcome::Failed(GENERATION_FAILED_MESSAGE.to_string())
            }
        }
    }
}
