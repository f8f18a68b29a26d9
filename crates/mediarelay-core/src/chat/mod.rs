//! Chat relay: one conversational turn against a chat completion vendor.
//!
//! The caller supplies the system prompt and history; nothing here ships
//! canned prompts or demo replies.

pub(crate) mod groq;
pub(crate) mod retry;

pub use groq::GroqProvider;

use crate::error::JobError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One message of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user", or "assistant"
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.to_string(),
        }
    }
}

/// A chat turn: optional system prompt, prior history, and the new message.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: Option<String>,
    pub history: Vec<ChatMessage>,
    pub message: String,
}

impl ChatRequest {
    pub fn new(message: &str) -> Self {
        Self {
            system: None,
            history: Vec::new(),
            message: message.to_string(),
        }
    }

    pub fn with_system(mut self, system: Option<&str>) -> Self {
        self.system = system
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);
        self
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    /// Flatten into the message list sent to the vendor.
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        if let Some(system) = &self.system {
            messages.push(ChatMessage::system(system));
        }
        messages.extend(self.history.iter().cloned());
        messages.push(ChatMessage::user(&self.message));
        messages
    }
}

/// The vendor's answer to a chat turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    /// Generated reply
    pub text: String,
    /// Model identifier used
    pub model: String,
    /// Number of tokens used (input + output), if reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that chat vendors implement.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Generate a reply for the given request.
    async fn generate(&self, request: &ChatRequest) -> Result<ChatReply, JobError>;

    /// Per-request timeout for this provider.
    fn timeout(&self) -> Duration;
}

/// Chat client that retries transient failures with exponential backoff.
pub struct ChatClient {
    provider: Box<dyn ChatProvider>,
    retry_attempts: u32,
    retry_delay_ms: u64,
}

impl ChatClient {
    pub fn new(provider: Box<dyn ChatProvider>, retry_attempts: u32, retry_delay_ms: u64) -> Self {
        Self {
            provider,
            retry_attempts,
            retry_delay_ms,
        }
    }

    /// Send one chat turn, retrying retryable errors.
    pub async fn send(&self, request: &ChatRequest) -> Result<ChatReply, JobError> {
        if request.message.trim().is_empty() {
            return Err(JobError::InvalidRequest("message is required".into()));
        }

        let mut last_error = None;
        for attempt in 0..=self.retry_attempts {
            if attempt > 0 {
                let delay = retry::backoff_duration(attempt - 1, self.retry_delay_ms);
                tracing::debug!(
                    "Retry {attempt}/{} for {} after {delay:?}",
                    self.retry_attempts,
                    self.provider.name()
                );
                tokio::time::sleep(delay).await;
            }

            match tokio::time::timeout(self.provider.timeout(), self.provider.generate(request))
                .await
            {
                Ok(Ok(reply)) => {
                    tracing::info!(
                        "{} replied in {}ms ({} tokens)",
                        self.provider.name(),
                        reply.latency_ms,
                        reply
                            .tokens_used
                            .map_or_else(|| "?".to_string(), |t| t.to_string())
                    );
                    return Ok(reply);
                }
                Ok(Err(e)) => {
                    let retryable = retry::is_retryable(&e);
                    last_error = Some(e);
                    if !retryable {
                        break;
                    }
                }
                Err(_) => {
                    last_error = Some(JobError::Chat {
                        message: format!(
                            "Timeout after {}ms",
                            self.provider.timeout().as_millis()
                        ),
                        status_code: None,
                    });
                    // Timeouts are retryable
                }
            }
        }

        Err(last_error.unwrap_or_else(|| JobError::Chat {
            message: "chat request failed".to_string(),
            status_code: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Chat provider whose answer depends on the call index.
    struct MockChat {
        response_fn: Box<dyn Fn(u32) -> Result<ChatReply, JobError> + Send + Sync>,
        call_count: Arc<AtomicU32>,
        delay: Option<Duration>,
    }

    impl MockChat {
        fn new(
            response_fn: impl Fn(u32) -> Result<ChatReply, JobError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                response_fn: Box::new(response_fn),
                call_count: Arc::new(AtomicU32::new(0)),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl ChatProvider for MockChat {
        fn name(&self) -> &str {
            "mock"
        }

        async fn generate(&self, _request: &ChatRequest) -> Result<ChatReply, JobError> {
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            (self.response_fn)(idx)
        }

        fn timeout(&self) -> Duration {
            Duration::from_millis(50)
        }
    }

    fn reply(text: &str) -> ChatReply {
        ChatReply {
            text: text.to_string(),
            model: "mock-v1".to_string(),
            tokens_used: Some(7),
            latency_ms: 3,
        }
    }

    #[test]
    fn test_messages_order() {
        let request = ChatRequest::new("third")
            .with_system(Some("rules"))
            .with_history(vec![ChatMessage::user("first"), ChatMessage::assistant("second")]);
        let roles: Vec<_> = request.messages().into_iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
    }

    #[test]
    fn test_blank_system_prompt_dropped() {
        let request = ChatRequest::new("hi").with_system(Some("  "));
        assert_eq!(request.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_on_rate_limit() {
        let provider = MockChat::new(|idx| {
            if idx == 0 {
                Err(JobError::Chat {
                    message: "rate limited".into(),
                    status_code: Some(429),
                })
            } else {
                Ok(reply("recovered"))
            }
        });
        let calls = provider.call_count.clone();
        let client = ChatClient::new(Box::new(provider), 2, 1);

        let reply = client.send(&ChatRequest::new("hi")).await.unwrap();
        assert_eq!(reply.text, "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_retry_on_auth_error() {
        let provider = MockChat::new(|_| {
            Err(JobError::Chat {
                message: "unauthorized".into(),
                status_code: Some(401),
            })
        });
        let calls = provider.call_count.clone();
        let client = ChatClient::new(Box::new(provider), 3, 1);

        let err = client.send(&ChatRequest::new("hi")).await.unwrap_err();
        assert!(err.to_string().contains("unauthorized"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausts_retries() {
        let provider = MockChat::new(|_| {
            Err(JobError::Chat {
                message: "HTTP 503".into(),
                status_code: Some(503),
            })
        });
        let calls = provider.call_count.clone();
        let client = ChatClient::new(Box::new(provider), 2, 1);

        assert!(client.send(&ChatRequest::new("hi")).await.is_err());
        // 1 initial + 2 retries = 3 total calls
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_timeout() {
        let mut provider = MockChat::new(|_| Ok(reply("too slow")));
        provider.delay = Some(Duration::from_secs(5));
        let client = ChatClient::new(Box::new(provider), 0, 1);

        let err = client.send(&ChatRequest::new("hi")).await.unwrap_err();
        assert!(err.to_string().contains("Timeout"), "got: {err}");
    }

    #[tokio::test]
    async fn test_empty_message_rejected_without_call() {
        let provider = MockChat::new(|_| Ok(reply("unused")));
        let calls = provider.call_count.clone();
        let client = ChatClient::new(Box::new(provider), 0, 1);

        let err = client.send(&ChatRequest::new("   ")).await.unwrap_err();
        assert!(matches!(err, JobError::InvalidRequest(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
