use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{ChatTurn, FragmentStream, GenerationBackend, GenerationError};
use crate::presentation::config::{LlmProvider, LlmSettings};

/// Backend speaking the OpenAI-compatible streaming chat-completions
/// protocol. Covers both supported providers: Ollama exposes the same
/// wire format on its `/v1` endpoint, Azure behind a deployment path
/// with an `api-key` header.
pub struct StreamingGenerationBackend {
    client: Client,
    provider: LlmProvider,
    completions_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

impl StreamingGenerationBackend {
    fn build_request(&self, history: &[ChatTurn]) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: history
                .iter()
                .map(|turn| WireMessage {
                    role: turn.role.as_str(),
                    content: turn.content.clone(),
                })
                .collect(),
            temperature: self.temperature,
            stream: true,
        }
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match (&self.provider, &self.api_key) {
            (LlmProvider::Azure, Some(key)) => request.header("api-key", key),
            _ => request,
        }
    }
}

#[async_trait]
impl GenerationBackend for StreamingGenerationBackend {
    async fn generate(&self, history: &[ChatTurn]) -> Result<FragmentStream, GenerationError> {
        let request = self
            .client
            .post(&self.completions_url)
            .json(&self.build_request(history));

        let response = self
            .apply_auth(request)
            .send()
            .await
            .map_err(|e| GenerationError::Connection(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GenerationError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Connection(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let stream = response.bytes_stream();
        let fragments = Box::pin(stream.flat_map(|chunk_result| {
            let items: Vec<Result<String, GenerationError>> = match chunk_result {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes);
                    let mut fragments = Vec::new();
                    for line in text.lines() {
                        if let Some(data) = line.strip_prefix("data: ") {
                            if data == "[DONE]" {
                                break;
                            }
                            if let Ok(chunk) = serde_json::from_str::<ChatCompletionChunk>(data) {
                                if let Some(choice) = chunk.choices.first() {
                                    if let Some(content) = &choice.delta.content {
                                        fragments.push(Ok(content.clone()));
                                    }
                                }
                            }
                        }
                    }
                    fragments
                }
                Err(e) => vec![Err(GenerationError::Connection(e.to_string()))],
            };
            futures::stream::iter(items)
        }));

        Ok(fragments)
    }
}

/// Build the backend for the configured provider.
pub fn create_generation_backend(settings: &LlmSettings) -> StreamingGenerationBackend {
    let (completions_url, api_key, model) = match settings.provider {
        LlmProvider::Ollama => (
            format!(
                "{}/v1/chat/completions",
                settings.ollama.base_url.trim_end_matches('/')
            ),
            None,
            settings.ollama.model.clone(),
        ),
        LlmProvider::Azure => (
            format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                settings.azure.endpoint.trim_end_matches('/'),
                settings.azure.deployment_name,
                settings.azure.api_version
            ),
            Some(settings.azure.api_key.clone()),
            settings.azure.model.clone(),
        ),
    };

    StreamingGenerationBackend {
        client: Client::new(),
        provider: settings.provider,
        completions_url,
        api_key,
        model,
        temperature: settings.temperature,
    }
}
