//! Language-model client
//!
//! Thin chat-completions client: prompt string plus stop sequences in,
//! generated text plus token-usage counters out. Usage is recorded as a
//! metrics side observation.

use async_trait::async_trait;
use rapt_common::config::LlmConfig;
use rapt_common::errors::{AppError, Result};
use rapt_common::metrics::LLM_TOKENS_TOTAL;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A generated completion with usage counters.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Trait for text generation
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a completion for `prompt`, stopping at any of `stop`.
    async fn generate(&self, prompt: &str, stop: &[String], temperature: f32)
        -> Result<Completion>;
}

/// OpenAI-compatible chat completions client
#[derive(Debug)]
pub struct OpenAiChat {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    stop: &'a [String],
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

impl OpenAiChat {
    /// Create a new chat client from configuration.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::Configuration {
                message: "llm.api_key is required".to_string(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn generate(
        &self,
        prompt: &str,
        stop: &[String],
        temperature: f32,
    ) -> Result<Completion> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
            stop,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Completion {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Completion {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: ChatResponse = response.json().await.map_err(|e| AppError::Completion {
            message: format!("Failed to parse response: {}", e),
        })?;

        let text = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::Completion {
                message: "Empty response from language model".to_string(),
            })?;

        let usage = result.usage.unwrap_or_default();
        metrics::counter!(LLM_TOKENS_TOTAL, "kind" => "prompt").increment(usage.prompt_tokens);
        metrics::counter!(LLM_TOKENS_TOTAL, "kind" => "completion")
            .increment(usage.completion_tokens);
        debug!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Completion generated"
        );

        Ok(Completion {
            text,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        })
    }
}
