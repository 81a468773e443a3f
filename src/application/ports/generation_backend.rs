use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::Stream;

use crate::domain::MessageRole;

/// One role-tagged entry in the history handed to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: MessageRole,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Lazy, single-pass sequence of generated text fragments. Not
/// restartable; may yield an error at any point.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, GenerationError>> + Send>>;

/// Capability producing a reply for an ordered conversation history.
///
/// Implementations are stateless with respect to individual
/// conversations and may be shared across concurrent turns.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, history: &[ChatTurn]) -> Result<FragmentStream, GenerationError>;
}

/// Errors raised while producing fragments. `Display` yields the bare
/// human-readable description; use `kind` for structured logging.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    #[error("{0}")]
    Connection(String),
    #[error("{0}")]
    InvalidResponse(String),
    #[error("rate limited")]
    RateLimited,
}

impl GenerationError {
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Connection(_) => "connection",
            GenerationError::InvalidResponse(_) => "invalid_response",
            GenerationError::RateLimited => "rate_limited",
        }
    }
}
