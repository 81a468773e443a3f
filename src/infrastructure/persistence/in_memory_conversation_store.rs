use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::application::ports::{ConversationStore, StoreError};
use crate::domain::{Conversation, ConversationId, Message, MessageRole};

/// Store kept entirely in process memory. Used by tests and local
/// scaffolding; messages keep their insertion order, which doubles as
/// the tiebreak for coarse timestamps.
#[derive(Default)]
pub struct InMemoryConversationStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|e| StoreError::QueryFailed(format!("store lock poisoned: {}", e)))
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn find_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.conversations.iter().find(|c| c.id == id).cloned())
    }

    async fn create_conversation(&self, title: &str) -> Result<Conversation, StoreError> {
        let conversation = Conversation::new(title);
        let mut inner = self.lock()?;
        inner.conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn update_conversation_title(
        &self,
        id: ConversationId,
        title: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let conversation = inner
            .conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("conversation {}", id)))?;

        conversation.title = title.to_string();
        conversation.updated_at = Utc::now();
        Ok(())
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>, StoreError> {
        let inner = self.lock()?;
        let mut conversations = inner.conversations.clone();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(conversations)
    }

    async fn list_messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    async fn create_message(
        &self,
        conversation_id: ConversationId,
        role: MessageRole,
        content: &str,
    ) -> Result<Message, StoreError> {
        let message = Message::new(conversation_id, role, content.to_string());
        let mut inner = self.lock()?;

        let conversation = inner
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
            .ok_or_else(|| StoreError::NotFound(format!("conversation {}", conversation_id)))?;
        conversation.updated_at = message.created_at;

        inner.messages.push(message.clone());
        Ok(message)
    }
}
