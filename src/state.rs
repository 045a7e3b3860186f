use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use teloxide::types::ChatId;

use crate::llm::types::ImageGenerator;
use crate::studio::session::Studio;

/// Bot-wide state: the shared generation client and one studio session per
/// chat. Sessions live in memory only and are lost on restart.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn ImageGenerator>,
    pub studios: Arc<Mutex<HashMap<ChatId, Arc<Studio>>>>,
}

impl AppState {
    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        AppState {
            generator,
            studios: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn studio_for(&self, chat_id: ChatId) -> Arc<Studio> {
        let mut studios = self.studios.lock();
        studios
            .entry(chat_id)
            .or_insert_with(|| Arc::new(Studio::new(self.generator.clone())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::llm::media::ImagePayload;
    use crate::llm::types::{GeneratedImage, GenerationError};
    use crate::studio::session::StudioMode;

    struct Unreachable;

    #[async_trait]
    impl ImageGenerator for Unreachable {
        fn model(&self) -> &str {
            "unreachable"
        }

        async fn generate(
            &self,
            _instruction: &str,
            _image: &ImagePayload,
        ) -> Result<GeneratedImage, GenerationError> {
            Err(GenerationError::Transport("offline".to_string()))
        }
    }

    #[test]
    fn sessions_are_scoped_per_chat() {
        let state = AppState::new(Arc::new(Unreachable));
        state.studio_for(ChatId(1)).set_mode(StudioMode::Portrait);

        assert_eq!(state.studio_for(ChatId(1)).snapshot().mode, StudioMode::Portrait);
        assert_eq!(state.studio_for(ChatId(2)).snapshot().mode, StudioMode::Emote);
        assert_eq!(state.studios.lock().len(), 2);
    }
}
