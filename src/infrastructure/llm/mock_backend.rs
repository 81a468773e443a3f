use async_trait::async_trait;

use crate::application::ports::{ChatTurn, FragmentStream, GenerationBackend, GenerationError};

/// Backend yielding a canned sequence of fragments.
pub struct MockGenerationBackend {
    fragments: Vec<String>,
}

impl MockGenerationBackend {
    pub fn new(fragments: Vec<String>) -> Self {
        Self { fragments }
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate(&self, _history: &[ChatTurn]) -> Result<FragmentStream, GenerationError> {
        let fragments = self.fragments.clone();
        Ok(Box::pin(futures::stream::iter(
            fragments.into_iter().map(Ok),
        )))
    }
}
