use async_trait::async_trait;

use crate::domain::{Conversation, ConversationId, Message, MessageRole};

/// Durable keyed storage for conversations and their ordered messages.
///
/// Messages returned by `list_messages` are ordered by creation time
/// ascending, ties broken by insertion order.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn find_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, StoreError>;

    async fn create_conversation(&self, title: &str) -> Result<Conversation, StoreError>;

    async fn update_conversation_title(
        &self,
        id: ConversationId,
        title: &str,
    ) -> Result<(), StoreError>;

    async fn list_conversations(&self) -> Result<Vec<Conversation>, StoreError>;

    async fn list_messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, StoreError>;

    async fn create_message(
        &self,
        conversation_id: ConversationId,
        role: MessageRole,
        content: &str,
    ) -> Result<Message, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    #[error("not found: {0}")]
    NotFound(String),
}
