//! Kie.ai job API backend.
//!
//! Tasks are created with `POST {endpoint}/api/v1/jobs/createTask` and a
//! `{ model, input }` body, then looked up by ID. Kie.ai reports most errors
//! in-band (`code` + `msg`), so submission bodies are parsed whatever the
//! HTTP status.

use super::backend::JobBackend;
use crate::config::KieConfig;
use crate::error::JobError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// Kie.ai backend using bearer + `X-API-Key` authentication.
pub struct KieBackend {
    api_key: String,
    endpoint: String,
    create_path: String,
    status_path: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl KieBackend {
    pub fn new(config: &KieConfig, api_key: &str) -> Self {
        Self::with_client(reqwest::Client::new(), config, api_key)
    }

    /// Create a backend reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &KieConfig, api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            create_path: config.create_path.clone(),
            status_path: config.status_path.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            client,
        }
    }

    fn create_url(&self) -> String {
        format!("{}{}", self.endpoint, self.create_path)
    }

    fn status_url(&self, id: &str) -> String {
        format!("{}{}", self.endpoint, self.status_path.replace("{id}", id))
    }
}

#[derive(Serialize)]
struct CreateTaskRequest<'a> {
    model: &'a str,
    input: &'a Map<String, Value>,
}

/// Parse a response body, attaching the HTTP status when it is not JSON.
fn parse_body(status: reqwest::StatusCode, text: &str) -> Result<Value, JobError> {
    serde_json::from_str(text).map_err(|_| JobError::Transient {
        message: format!("Invalid JSON (HTTP {status}): {}", truncate(text, 300)),
        status_code: (!status.is_success()).then_some(status.as_u16()),
    })
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl JobBackend for KieBackend {
    fn name(&self) -> &str {
        "kie"
    }

    async fn create_task(&self, model: &str, input: &Map<String, Value>) -> Result<Value, JobError> {
        let resp = self
            .client
            .post(self.create_url())
            .bearer_auth(&self.api_key)
            .header("X-API-Key", &self.api_key)
            .json(&CreateTaskRequest { model, input })
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| JobError::transient(format!("Kie.ai request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| JobError::transient(format!("Failed to read Kie.ai response: {e}")))?;
        tracing::debug!("Kie.ai createTask [{model}] HTTP {status}: {}", truncate(&text, 300));

        parse_body(status, &text)
    }

    async fn get_task(&self, id: &str) -> Result<Value, JobError> {
        let resp = self
            .client
            .get(self.status_url(id))
            .bearer_auth(&self.api_key)
            .header("X-API-Key", &self.api_key)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| JobError::transient(format!("Kie.ai status request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(JobError::Transient {
                message: format!("Kie.ai HTTP {status}: {}", truncate(&text, 300)),
                status_code: Some(status.as_u16()),
            });
        }

        let text = resp
            .text()
            .await
            .map_err(|e| JobError::transient(format!("Failed to read Kie.ai response: {e}")))?;
        tracing::trace!("Kie.ai task {id}: {}", truncate(&text, 300));

        parse_body(status, &text)
    }
}
