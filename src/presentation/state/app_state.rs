use std::sync::Arc;

use crate::application::ports::{ConversationStore, GenerationBackend};
use crate::application::services::ChatService;
use crate::presentation::config::Settings;

pub struct AppState<S, B>
where
    S: ConversationStore,
    B: GenerationBackend,
{
    pub chat_service: Arc<ChatService<S, B>>,
    pub conversation_store: Arc<S>,
    pub settings: Settings,
}

impl<S, B> Clone for AppState<S, B>
where
    S: ConversationStore,
    B: GenerationBackend,
{
    fn clone(&self) -> Self {
        Self {
            chat_service: Arc::clone(&self.chat_service),
            conversation_store: Arc::clone(&self.conversation_store),
            settings: self.settings.clone(),
        }
    }
}
