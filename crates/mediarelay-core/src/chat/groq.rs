//! Groq chat provider using the OpenAI-compatible Chat Completions API.

use super::{ChatMessage, ChatProvider, ChatReply, ChatRequest};
use crate::config::GroqConfig;
use crate::error::JobError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Groq provider.
pub struct GroqProvider {
    api_key: String,
    model: String,
    endpoint: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
    client: reqwest::Client,
}

impl GroqProvider {
    pub fn new(config: &GroqConfig, api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_millis(config.timeout_ms),
            client: reqwest::Client::new(),
        }
    }

    /// Override the configured model.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    fn build_body(&self, request: &ChatRequest) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages: request.messages(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

// --- Response types ---

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    model: String,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u32,
}

/// Pull the reply text out of a completion response.
fn reply_from(resp: CompletionResponse, latency_ms: u64) -> Result<ChatReply, JobError> {
    let text = resp
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| JobError::Chat {
            message: "Groq returned no choices, no content generated".to_string(),
            status_code: None,
        })?;

    Ok(ChatReply {
        text,
        model: resp.model,
        tokens_used: resp.usage.map(|u| u.total_tokens),
        latency_ms,
    })
}

#[async_trait]
impl ChatProvider for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    async fn generate(&self, request: &ChatRequest) -> Result<ChatReply, JobError> {
        let start = Instant::now();
        let body = self.build_body(request);

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| JobError::Chat {
                message: format!("Groq request failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(JobError::Chat {
                message: format!("Groq HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        let completion: CompletionResponse = resp.json().await.map_err(|e| JobError::Chat {
            message: format!("Failed to parse Groq response: {e}"),
            status_code: None,
        })?;

        reply_from(completion, start.elapsed().as_millis() as u64)
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
