use super::Environment;

/// Runtime configuration, read from environment variables with the
/// same defaults the deployment scripts assume. Secrets never leave
/// this struct through `Debug` logging; log individual fields instead.
#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: Environment,
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub llm: LlmSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub ollama: OllamaSettings,
    pub azure: AzureSettings,
    pub temperature: f32,
    pub sse_keep_alive_seconds: u64,
    pub fallback_chunk_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Ollama,
    Azure,
}

impl TryFrom<String> for LlmProvider {
    type Error = SettingsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "azure" => Ok(Self::Azure),
            other => Err(SettingsError::UnsupportedProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OllamaSettings {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct AzureSettings {
    pub endpoint: String,
    pub api_key: String,
    pub deployment_name: String,
    pub model: String,
    pub api_version: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("unsupported LLM provider: {0}")]
    UnsupportedProvider(String),
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let environment = env_or("APP_ENV", "local");
        let environment = Environment::try_from(environment.clone()).map_err(|_| {
            SettingsError::InvalidValue {
                name: "APP_ENV",
                value: environment,
            }
        })?;

        Ok(Self {
            environment,
            server: ServerSettings {
                host: env_or("SERVER_HOST", "0.0.0.0"),
                port: parse_env("SERVER_PORT", 8000)?,
            },
            database: DatabaseSettings {
                host: env_or("DB_HOST", "localhost"),
                port: parse_env("DB_PORT", 5432)?,
                name: env_or("DB_NAME", "chat_db"),
                user: env_or("DB_USER", "postgres"),
                password: env_or("DB_PASSWORD", "postgres"),
                max_connections: parse_env("DB_MAX_CONNECTIONS", 5)?,
            },
            llm: LlmSettings {
                provider: LlmProvider::try_from(env_or("LLM_PROVIDER", "ollama"))?,
                ollama: OllamaSettings {
                    base_url: env_or("OLLAMA_BASE_URL", "http://localhost:11434"),
                    model: env_or("OLLAMA_MODEL", "llama3.2"),
                },
                azure: AzureSettings {
                    endpoint: env_or("AZURE_OPENAI_ENDPOINT", "https://openai.azure.com/"),
                    api_key: env_or("AZURE_OPENAI_API_KEY", ""),
                    deployment_name: env_or("AZURE_OPENAI_DEPLOYMENT_NAME", "gpt-4o"),
                    model: env_or("AZURE_OPENAI_MODEL_NAME", "gpt-4o"),
                    api_version: env_or("AZURE_OPENAI_API_VERSION", "2024-08-01-preview"),
                },
                temperature: parse_env("LLM_TEMPERATURE", 0.7)?,
                sse_keep_alive_seconds: parse_env("SSE_KEEP_ALIVE_SECONDS", 15)?,
                fallback_chunk_delay_ms: parse_env("FALLBACK_CHUNK_DELAY_MS", 100)?,
            },
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, SettingsError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| SettingsError::InvalidValue { name, value }),
        Err(_) => Ok(default),
    }
}
