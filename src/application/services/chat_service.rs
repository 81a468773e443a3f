use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    ChatTurn, ConversationStore, GenerationBackend, GenerationError, StoreError,
};
use crate::domain::{Conversation, ConversationId, MessageRole};

/// Titles derived from the first user message are cut at this many
/// characters, counted on `char` boundaries.
const TITLE_MAX_CHARS: usize = 50;

/// Framed event emitted on the outbound stream, one per logical step of
/// a turn. Serializes as `{"type": "...", "data": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ChatEvent {
    ConversationId(String),
    UserMessage(String),
    AssistantChunk(String),
    Complete(String),
    Error(String),
}

/// Orchestrates one chat turn: resolve the conversation, persist the
/// inbound message, replay history, drive the generation backend, and
/// persist the reply — emitting a framed event for every step.
pub struct ChatService<S, B>
where
    S: ConversationStore,
    B: GenerationBackend,
{
    store: Arc<S>,
    backend: Arc<B>,
    fallback_chunk_delay: Duration,
}

impl<S, B> ChatService<S, B>
where
    S: ConversationStore + 'static,
    B: GenerationBackend + 'static,
{
    pub fn new(store: Arc<S>, backend: Arc<B>, fallback_chunk_delay: Duration) -> Self {
        Self {
            store,
            backend,
            fallback_chunk_delay,
        }
    }

    /// Process one turn and return its lazy event sequence.
    ///
    /// The sequence always ends with a terminal `Complete` or `Error`
    /// event. Backend failures never surface as `Error`; they divert to
    /// the deterministic echo fallback instead. Dropping the stream
    /// abandons in-flight generation; writes that already completed
    /// stay committed.
    pub fn process_chat_stream(
        &self,
        user_message: String,
        conversation_id: Option<ConversationId>,
    ) -> BoxStream<'static, ChatEvent> {
        let store = Arc::clone(&self.store);
        let backend = Arc::clone(&self.backend);
        let fallback_delay = self.fallback_chunk_delay;

        Box::pin(stream! {
            let conversation = match Self::resolve_conversation(&store, conversation_id).await {
                Ok(conversation) => conversation,
                Err(e) => {
                    tracing::error!(error = %e, "failed to resolve conversation");
                    yield ChatEvent::Error(e.to_string());
                    return;
                }
            };
            yield ChatEvent::ConversationId(conversation.id.to_string());

            // The inbound write must land before history is loaded so the
            // new message is part of the generation context.
            if let Err(e) = store
                .create_message(conversation.id, MessageRole::User, &user_message)
                .await
            {
                tracing::error!(conversation_id = %conversation.id, error = %e, "failed to persist user message");
                yield ChatEvent::Error(e.to_string());
                return;
            }
            yield ChatEvent::UserMessage(user_message.clone());

            let history = match Self::load_history(&store, conversation.id).await {
                Ok(history) => history,
                Err(e) => {
                    tracing::error!(conversation_id = %conversation.id, error = %e, "failed to load history");
                    yield ChatEvent::Error(e.to_string());
                    return;
                }
            };

            let mut assistant_content = String::new();
            let mut generation_failure = None;

            match backend.generate(&history).await {
                Ok(mut fragments) => {
                    while let Some(fragment) = fragments.next().await {
                        match fragment {
                            Ok(text) => {
                                if text.is_empty() {
                                    continue;
                                }
                                assistant_content.push_str(&text);
                                yield ChatEvent::AssistantChunk(text);
                            }
                            Err(e) => {
                                generation_failure = Some(e);
                                break;
                            }
                        }
                    }
                }
                Err(e) => generation_failure = Some(e),
            }

            if let Some(e) = generation_failure {
                tracing::error!(
                    conversation_id = %conversation.id,
                    kind = e.kind(),
                    error = %e,
                    "generation backend failed, serving echo fallback"
                );
                // Partial content from the failed attempt is discarded so
                // the persisted reply is the fallback text, not a mix.
                assistant_content = fallback_reply(&user_message, &e);
                for token in assistant_content.split_whitespace() {
                    yield ChatEvent::AssistantChunk(format!("{} ", token));
                    tokio::time::sleep(fallback_delay).await;
                }
            }

            let assistant_message = match store
                .create_message(conversation.id, MessageRole::Assistant, &assistant_content)
                .await
            {
                Ok(message) => message,
                Err(e) => {
                    tracing::error!(conversation_id = %conversation.id, error = %e, "failed to persist assistant message");
                    yield ChatEvent::Error(e.to_string());
                    return;
                }
            };

            if conversation.has_default_title() && !user_message.is_empty() {
                let title = derive_title(&user_message);
                if let Err(e) = store
                    .update_conversation_title(conversation.id, &title)
                    .await
                {
                    tracing::error!(conversation_id = %conversation.id, error = %e, "failed to update conversation title");
                    yield ChatEvent::Error(e.to_string());
                    return;
                }
            }

            yield ChatEvent::Complete(assistant_message.id.to_string());
        })
    }

    /// Return the existing conversation for a known id; otherwise create
    /// a fresh one with the sentinel title. An unknown supplied id is
    /// treated as "start a new conversation" rather than an error.
    async fn resolve_conversation(
        store: &S,
        requested: Option<ConversationId>,
    ) -> Result<Conversation, StoreError> {
        if let Some(id) = requested {
            if let Some(conversation) = store.find_conversation(id).await? {
                return Ok(conversation);
            }
            tracing::debug!(conversation_id = %id, "unknown conversation id, creating a new conversation");
        }

        store
            .create_conversation(crate::domain::DEFAULT_CONVERSATION_TITLE)
            .await
    }

    /// Replay the full message history as backend-facing turns. Only
    /// user and assistant roles are forwarded; anything else is dropped.
    async fn load_history(
        store: &S,
        conversation_id: ConversationId,
    ) -> Result<Vec<ChatTurn>, StoreError> {
        let messages = store.list_messages(conversation_id).await?;

        Ok(messages
            .into_iter()
            .filter(|m| matches!(m.role, MessageRole::User | MessageRole::Assistant))
            .map(|m| ChatTurn::new(m.role, m.content))
            .collect())
    }
}

fn derive_title(user_message: &str) -> String {
    let title: String = user_message.chars().take(TITLE_MAX_CHARS).collect();
    if user_message.chars().count() > TITLE_MAX_CHARS {
        format!("{}...", title)
    } else {
        title
    }
}

fn fallback_reply(user_message: &str, error: &GenerationError) -> String {
    format!(
        "Echo: {}\n\n(Note: Unable to connect to LLM. Make sure LLM is running and available. Error: {})",
        user_message, error
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_short_message_when_deriving_title_then_kept_verbatim() {
        assert_eq!(derive_title("hello"), "hello");
    }

    #[test]
    fn given_long_message_when_deriving_title_then_truncated_with_ellipsis() {
        let message = "a".repeat(60);
        let title = derive_title(&message);
        assert_eq!(title, format!("{}...", "a".repeat(50)));
    }

    #[test]
    fn given_exactly_fifty_chars_when_deriving_title_then_no_ellipsis() {
        let message = "b".repeat(50);
        assert_eq!(derive_title(&message), message);
    }

    #[test]
    fn given_multibyte_message_when_deriving_title_then_cut_on_char_boundary() {
        let message = "é".repeat(60);
        let title = derive_title(&message);
        assert_eq!(title, format!("{}...", "é".repeat(50)));
    }

    #[test]
    fn given_backend_error_when_building_fallback_then_text_is_deterministic() {
        let error = GenerationError::Connection("boom".to_string());
        assert_eq!(
            fallback_reply("hello", &error),
            "Echo: hello\n\n(Note: Unable to connect to LLM. Make sure LLM is running and available. Error: boom)"
        );
    }
}
