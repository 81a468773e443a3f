mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    AzureSettings, DatabaseSettings, LlmProvider, LlmSettings, OllamaSettings, ServerSettings,
    Settings, SettingsError,
};
