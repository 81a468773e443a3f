use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;
use tokio::net::TcpListener;

use kuantan::application::services::ChatService;
use kuantan::infrastructure::llm::create_generation_backend;
use kuantan::infrastructure::observability::{TracingConfig, init_tracing};
use kuantan::infrastructure::persistence::{PgConversationStore, create_pool};
use kuantan::presentation::{AppState, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    init_tracing(
        TracingConfig {
            environment: settings.environment.to_string(),
            ..TracingConfig::default()
        },
        settings.server.port,
    );

    let db = &settings.database;
    let connect_options = PgConnectOptions::new()
        .host(&db.host)
        .port(db.port)
        .database(&db.name)
        .username(&db.user)
        .password(&db.password);
    let pool = create_pool(connect_options, db.max_connections).await?;

    let store = Arc::new(PgConversationStore::new(pool));
    let backend = Arc::new(create_generation_backend(&settings.llm));

    let chat_service = Arc::new(ChatService::new(
        Arc::clone(&store),
        Arc::clone(&backend),
        Duration::from_millis(settings.llm.fallback_chunk_delay_ms),
    ));

    let state = AppState {
        chat_service,
        conversation_store: store,
        settings: settings.clone(),
    };

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, provider = ?settings.llm.provider, "Chat server listening");

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
