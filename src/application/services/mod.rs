mod chat_service;

pub use chat_service::{ChatEvent, ChatService};
