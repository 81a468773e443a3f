use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;
use uuid::Uuid;

use kuantan::application::ports::{
    ChatTurn, ConversationStore, FragmentStream, GenerationBackend, GenerationError,
};
use kuantan::application::services::{ChatEvent, ChatService};
use kuantan::infrastructure::llm::MockGenerationBackend;
use kuantan::infrastructure::persistence::InMemoryConversationStore;
use kuantan::presentation::{AppState, Settings, create_router};

struct FailingBackend;

#[async_trait]
impl GenerationBackend for FailingBackend {
    async fn generate(&self, _history: &[ChatTurn]) -> Result<FragmentStream, GenerationError> {
        Err(GenerationError::Connection("connection refused".to_string()))
    }
}

fn create_test_app<B: GenerationBackend + 'static>(
    backend: B,
) -> (Arc<InMemoryConversationStore>, axum::Router) {
    let store = Arc::new(InMemoryConversationStore::new());
    let backend = Arc::new(backend);
    let chat_service = Arc::new(ChatService::new(
        Arc::clone(&store),
        backend,
        Duration::ZERO,
    ));

    let state = AppState {
        chat_service,
        conversation_store: Arc::clone(&store),
        settings: Settings::from_env().expect("default settings"),
    };

    (store, create_router(state))
}

fn happy_app() -> (Arc<InMemoryConversationStore>, axum::Router) {
    create_test_app(MockGenerationBackend::new(vec![
        "Hi".to_string(),
        " there".to_string(),
    ]))
}

async fn read_events(response: axum::response::Response) -> Vec<ChatEvent> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read sse body");
    let body = String::from_utf8(bytes.to_vec()).expect("utf8 body");

    body.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str::<ChatEvent>(data).expect("well-formed event"))
        .collect()
}

fn chat_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn given_running_server_when_health_check_then_returns_ok() {
    let (_, app) = happy_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn given_chat_request_when_streaming_then_sse_carries_framed_events() {
    let (_, app) = happy_app();

    let response = app.oneshot(chat_request(r#"{"message": "hello"}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/event-stream"));

    let events = read_events(response).await;
    assert!(matches!(events[0], ChatEvent::ConversationId(_)));
    assert_eq!(events[1], ChatEvent::UserMessage("hello".to_string()));
    assert_eq!(events[2], ChatEvent::AssistantChunk("Hi".to_string()));
    assert_eq!(events[3], ChatEvent::AssistantChunk(" there".to_string()));
    assert!(matches!(events[4], ChatEvent::Complete(_)));
}

#[tokio::test]
async fn given_completed_turn_when_listing_conversations_then_it_appears_titled() {
    let (_, app) = happy_app();

    let response = app
        .clone()
        .oneshot(chat_request(r#"{"message": "hello"}"#))
        .await
        .unwrap();
    let events = read_events(response).await;
    let conversation_id = match &events[0] {
        ChatEvent::ConversationId(id) => id.clone(),
        other => panic!("expected conversation_id, got {:?}", other),
    };

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/conversations")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let listed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(listed[0]["id"], serde_json::Value::String(conversation_id));
    assert_eq!(listed[0]["title"], "hello");
}

#[tokio::test]
async fn given_completed_turn_when_fetching_conversation_then_messages_are_ordered() {
    let (_, app) = happy_app();

    let response = app
        .clone()
        .oneshot(chat_request(r#"{"message": "hello"}"#))
        .await
        .unwrap();
    let events = read_events(response).await;
    let conversation_id = match &events[0] {
        ChatEvent::ConversationId(id) => id.clone(),
        other => panic!("expected conversation_id, got {:?}", other),
    };

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/conversations/{}", conversation_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let fetched: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(fetched["messages"][0]["role"], "user");
    assert_eq!(fetched["messages"][0]["content"], "hello");
    assert_eq!(fetched["messages"][1]["role"], "assistant");
    assert_eq!(fetched["messages"][1]["content"], "Hi there");
}

#[tokio::test]
async fn given_unknown_conversation_when_fetching_then_returns_not_found() {
    let (_, app) = happy_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/conversations/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn given_backend_down_when_chatting_then_stream_falls_back_and_completes() {
    let (store, app) = create_test_app(FailingBackend);

    let response = app
        .oneshot(chat_request(r#"{"message": "hello"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let events = read_events(response).await;

    assert!(matches!(events[0], ChatEvent::ConversationId(_)));
    assert!(matches!(events.last(), Some(ChatEvent::Complete(_))));
    assert!(
        events
            .iter()
            .all(|e| !matches!(e, ChatEvent::Error(_))),
        "backend failure must not surface as an error event"
    );

    let conversations = store.list_conversations().await.unwrap();
    let messages = store.list_messages(conversations[0].id).await.unwrap();
    assert!(messages[1].content.starts_with("Echo: hello"));
}

#[tokio::test]
async fn given_missing_body_when_chatting_then_returns_bad_request() {
    let (_, app) = happy_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header("content-type", "application/json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn given_request_without_id_header_when_handled_then_id_is_assigned() {
    let (_, app) = happy_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}
