pub mod free_chat;
pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

/// Sampling temperature for free-chat answers.
pub const TEMPERATURE: f32 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// The system prompt followed by the conversation, as chat APIs expect.
pub fn with_system_prompt(system_prompt: &str, messages: &[Message]) -> Vec<Message> {
    std::iter::once(Message::system(system_prompt))
        .chain(messages.iter().cloned())
        .collect()
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String>;
}

/// Builds the provider named by `LLM_PROVIDER`. Anything other than
/// `ollama` is treated as an OpenAI-compatible endpoint.
pub fn from_config(config: &AppConfig) -> anyhow::Result<Box<dyn LlmProvider>> {
    match config.llm_provider.as_str() {
        "ollama" => {
            tracing::info!(
                "using Ollama LLM provider (url: {}, model: {})",
                config.ollama_url,
                config.ollama_model
            );
            Ok(Box::new(ollama::OllamaProvider::new(
                config.ollama_url.clone(),
                config.ollama_model.clone(),
            )))
        }
        _ => {
            anyhow::ensure!(
                !config.openai_api_key.is_empty(),
                "OPENAI_API_KEY must be set when LLM_PROVIDER=openai"
            );
            tracing::info!("using OpenAI LLM provider (model: {})", config.openai_model);
            Ok(Box::new(openai::OpenAiProvider::new(
                config.openai_url.clone(),
                config.openai_api_key.clone(),
                config.openai_model.clone(),
            )))
        }
    }
}
