mod chat;
mod conversations;
mod health;

pub use chat::{ChatRequest, chat_handler};
pub use conversations::{get_conversation_handler, list_conversations_handler};
pub use health::health_handler;
