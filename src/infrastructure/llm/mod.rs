mod mock_backend;
mod streaming_backend;

pub use mock_backend::MockGenerationBackend;
pub use streaming_backend::{StreamingGenerationBackend, create_generation_backend};
