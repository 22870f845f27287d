use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{with_system_prompt, LlmProvider, Message, TEMPERATURE};

/// Local models served by Ollama's `/api/chat`.
pub struct OllamaProvider {
    url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(url: String, model: String) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    stream: bool,
    options: Options,
}

#[derive(Serialize)]
struct Options {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<Message>,
    error: Option<String>,
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: with_system_prompt(system_prompt, messages),
            stream: false,
            options: Options {
                temperature: TEMPERATURE,
            },
        };

        let resp = self
            .client
            .post(format!("{}/api/chat", self.url))
            .json(&body)
            .send()
            .await
            .context("failed to call Ollama API")?;

        let status = resp.status();
        let data: ChatResponse = resp
            .json()
            .await
            .context("failed to parse Ollama response")?;

        if let Some(error) = data.error {
            anyhow::bail!("Ollama API error ({status}): {error}");
        }
        anyhow::ensure!(status.is_success(), "Ollama API error ({status})");

        data.message
            .map(|m| m.content)
            .ok_or_else(|| anyhow::anyhow!("missing message in Ollama response"))
    }
}
