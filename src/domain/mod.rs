mod conversation;
mod conversation_id;
mod message;
mod message_id;
mod message_role;

pub use conversation::{Conversation, DEFAULT_CONVERSATION_TITLE};
pub use conversation_id::ConversationId;
pub use message::Message;
pub use message_id::MessageId;
pub use message_role::MessageRole;
