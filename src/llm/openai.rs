//! OpenAI-compatible chat completion client.

use crate::config::LlmConfig;
use crate::llm::{Generation, GenerationClient};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Generation via an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiGenerationClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

impl OpenAiGenerationClient {
    /// Create the client.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ProviderUnavailable`] when no API key is
    /// configured.
    pub fn new(api_key: Option<String>, api_base: String, model: String) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::ProviderUnavailable("OPENAI_API_KEY is not set".into()))?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            api_base,
            model,
        })
    }

    /// Create the client from the generation section of the
    /// configuration.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Self::new(
            config.openai_api_key.clone(),
            config.openai_api_base.clone(),
            config.model.clone(),
        )
    }
}

#[async_trait]
impl GenerationClient for OpenAiGenerationClient {
    async fn generate(&self, prompt: &str) -> Result<Generation> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("generation request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Generation(format!(
                "generation request returned {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("invalid generation response: {}", e)))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::Generation("generation response held no choices".into()))?;

        let tokens_used = parsed.usage.map(|u| u.total_tokens);
        debug!(model = %self.model, ?tokens_used, "Generation complete");

        Ok(Generation { text, tokens_used })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
