use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::application::ports::{ConversationStore, GenerationBackend};
use crate::domain::ConversationId;
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<Uuid>,
}

/// POST /api/chat — run one turn and stream its framed events over SSE.
///
/// Empty messages are not rejected; they simply never trigger title
/// derivation. The event stream itself reports failures, so this
/// handler always answers 200 with a stream.
#[tracing::instrument(skip(state, request), fields(conversation_id = ?request.conversation_id))]
pub async fn chat_handler<S, B>(
    State(state): State<AppState<S, B>>,
    Json(request): Json<ChatRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: ConversationStore + 'static,
    B: GenerationBackend + 'static,
{
    tracing::debug!(prompt = %sanitize_prompt(&request.message), "Processing chat turn");

    let conversation_id = request.conversation_id.map(ConversationId::from_uuid);
    let events = state
        .chat_service
        .process_chat_stream(request.message, conversation_id);

    let sse_stream = events.map(|event| {
        let json = serde_json::to_string(&event).unwrap_or_default();
        Ok::<_, Infallible>(Event::default().data(json))
    });

    Sse::new(sse_stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(state.settings.llm.sse_keep_alive_seconds))
            .text("keep-alive"),
    )
}
