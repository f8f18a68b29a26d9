//! mediarelay core - relay images and prompts to AI vendor APIs.
//!
//! The heart of the crate is the asynchronous job protocol used by image and
//! video generation vendors:
//!
//! ```text
//! JobRequest → Submitter (candidate models in order) → JobHandle → Poller → Normalizer → URL
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use mediarelay_core::{Config, ImageInput, JobInput, Relay};
//!
//! #[tokio::main]
//! async fn main() -> mediarelay_core::Result<()> {
//!     let relay = Relay::new(Config::load()?);
//!     let preset = relay.config().preset("enhance-quality")?;
//!     let image = ImageInput::from_path("./photo.jpg".as_ref(), relay.max_upload_bytes()).await?;
//!     let input = JobInput::from_preset(preset).image(&image, &preset.image_fields);
//!
//!     let request = mediarelay_core::request_for(preset, &relay.config().polling, input.into_map())?;
//!     let outcome = relay.job_client()?.run(&request, preset.kind).await;
//!     println!("{}", serde_json::to_string(&outcome)?);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod chat;
pub mod config;
pub mod error;
pub mod job;
pub mod output;

// Re-exports for convenient access
pub use chat::{ChatClient, ChatMessage, ChatReply, ChatRequest};
pub use config::Config;
pub use error::{ConfigError, JobError, JobResult, RelayError, Result};
pub use job::{
    request_for, ArtifactKind, BatchJob, BatchRunner, ImageInput, JobClient, JobInput,
    JobOutcome, JobRequest, OutcomeStatus,
};
pub use output::{OutcomeWriter, OutputFormat};

use std::sync::Arc;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Entry point that turns configuration into vendor clients.
///
/// Clients are only built when asked for, and building one fails fast when
/// its API key is missing.
pub struct Relay {
    config: Config,
}

impl Relay {
    pub fn new(config: Config) -> Self {
        tracing::debug!("Initializing mediarelay v{}", VERSION);
        Self { config }
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Upload size limit in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.config.limits.max_upload_mb * 1024 * 1024
    }

    /// Build a job client backed by Kie.ai.
    pub fn job_client(&self) -> Result<JobClient> {
        let api_key = self.config.kie_api_key()?;
        let backend = job::KieBackend::new(&self.config.kie, &api_key);
        Ok(JobClient::new(Arc::new(backend)))
    }

    /// Build a chat client backed by Groq, optionally overriding the model.
    pub fn chat_client(&self, model_override: Option<&str>) -> Result<ChatClient> {
        let api_key = self.config.groq_api_key()?;
        let mut provider = chat::GroqProvider::new(&self.config.groq, &api_key);
        if let Some(model) = model_override {
            provider = provider.with_model(model);
        }
        Ok(ChatClient::new(
            Box::new(provider),
            self.config.groq.retry_attempts,
            self.config.groq.retry_delay_ms,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_job_client_requires_key() {
        let mut config = Config::default();
        config.kie.api_key = String::new();
        let relay = Relay::new(config);
        assert!(matches!(
            relay.job_client(),
            Err(RelayError::Config(ConfigError::MissingApiKey {
                service: "kie",
                ..
            }))
        ));
    }

    #[test]
    fn test_clients_built_with_literal_keys() {
        let mut config = Config::default();
        config.kie.api_key = "kie-key".to_string();
        config.groq.api_key = "groq-key".to_string();
        let relay = Relay::new(config);
        assert!(relay.job_client().is_ok());
        assert!(relay.chat_client(Some("llama-3.3-70b-versatile")).is_ok());
    }

    #[test]
    fn test_chat_client_requires_key() {
        let mut config = Config::default();
        config.groq.api_key = "${MEDIARELAY_TEST_UNSET_GROQ_KEY}".to_string();
        let err = Relay::new(config).chat_client(None).err().unwrap();
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn test_max_upload_bytes() {
        let relay = Relay::new(Config::default());
        assert_eq!(relay.max_upload_bytes(), 15 * 1024 * 1024);
    }
}
