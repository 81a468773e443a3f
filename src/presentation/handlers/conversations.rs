use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::application::ports::{ConversationStore, GenerationBackend};
use crate::domain::{Conversation, ConversationId, Message};
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct ConversationResponse {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationResponse {
    fn from(conversation: Conversation) -> Self {
        Self {
            id: conversation.id.as_uuid(),
            title: conversation.title,
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id.as_uuid(),
            conversation_id: message.conversation_id.as_uuid(),
            role: message.role.as_str().to_string(),
            content: message.content,
            created_at: message.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct ConversationWithMessagesResponse {
    #[serde(flatten)]
    pub conversation: ConversationResponse,
    pub messages: Vec<MessageResponse>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// GET /api/conversations — most recently active first.
pub async fn list_conversations_handler<S, B>(
    State(state): State<AppState<S, B>>,
) -> impl IntoResponse
where
    S: ConversationStore + 'static,
    B: GenerationBackend + 'static,
{
    match state.conversation_store.list_conversations().await {
        Ok(conversations) => {
            let conversations: Vec<ConversationResponse> =
                conversations.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(conversations)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to list conversations");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    message: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /api/conversations/{id} — conversation plus its ordered messages.
pub async fn get_conversation_handler<S, B>(
    State(state): State<AppState<S, B>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse
where
    S: ConversationStore + 'static,
    B: GenerationBackend + 'static,
{
    let conversation_id = ConversationId::from_uuid(id);

    let conversation = match state
        .conversation_store
        .find_conversation(conversation_id)
        .await
    {
        Ok(Some(conversation)) => conversation,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    message: format!("conversation {} not found", id),
                }),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!(conversation_id = %id, error = %e, "Failed to fetch conversation");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    message: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    match state.conversation_store.list_messages(conversation_id).await {
        Ok(messages) => {
            let response = ConversationWithMessagesResponse {
                conversation: conversation.into(),
                messages: messages.into_iter().map(Into::into).collect(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!(conversation_id = %id, error = %e, "Failed to fetch messages");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    message: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
