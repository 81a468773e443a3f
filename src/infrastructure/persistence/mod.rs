mod in_memory_conversation_store;
mod pg_conversation_store;
mod pg_pool;

pub use in_memory_conversation_store::InMemoryConversationStore;
pub use pg_conversation_store::PgConversationStore;
pub use pg_pool::create_pool;
