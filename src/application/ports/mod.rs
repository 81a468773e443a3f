mod conversation_store;
mod generation_backend;

pub use conversation_store::{ConversationStore, StoreError};
pub use generation_backend::{ChatTurn, FragmentStream, GenerationBackend, GenerationError};
