use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::application::ports::{ConversationStore, GenerationBackend};
use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    chat_handler, get_conversation_handler, health_handler, list_conversations_handler,
};
use crate::presentation::state::AppState;

pub fn create_router<S, B>(state: AppState<S, B>) -> Router
where
    S: ConversationStore + 'static,
    B: GenerationBackend + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat_handler::<S, B>))
        .route(
            "/api/conversations",
            get(list_conversations_handler::<S, B>),
        )
        .route(
            "/api/conversations/{id}",
            get(get_conversation_handler::<S, B>),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
