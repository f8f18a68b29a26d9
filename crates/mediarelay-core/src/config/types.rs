//! Sub-configuration structs with built-in defaults.

use crate::error::JobError;
use crate::job::ArtifactKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Kie.ai job API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KieConfig {
    /// API base URL
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Path of the task creation endpoint
    pub create_path: String,

    /// Path of the task status endpoint; `{id}` is replaced by the task ID
    pub status_path: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for KieConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.kie.ai".to_string(),
            api_key: "${KIE_API_KEY}".to_string(),
            create_path: "/api/v1/jobs/createTask".to_string(),
            status_path: "/api/v1/jobs/{id}".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// Groq chat completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroqConfig {
    /// Chat Completions endpoint
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Max retry attempts for transient failures
    pub retry_attempts: u32,

    /// Base backoff delay in milliseconds
    pub retry_delay_ms: u64,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            api_key: "${GROQ_API_KEY}".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.8,
            max_tokens: 500,
            retry_attempts: 2,
            retry_delay_ms: 1000,
            timeout_ms: 60_000,
        }
    }
}

/// Default polling cadence for asynchronous jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Fixed delay between status checks in milliseconds
    pub interval_ms: u64,

    /// Maximum number of status checks before giving up
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            max_attempts: 60,
        }
    }
}

/// Limits applied to user uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum upload size in megabytes
    pub max_upload_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { max_upload_mb: 15 }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// An input a preset cannot run without.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiredInput {
    Prompt,
    Image,
}

/// A named job recipe: which models to try and how to build their input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetConfig {
    /// Candidate model identifiers, tried in order
    pub candidates: Vec<String>,

    /// Kind of artifact the job produces
    #[serde(default)]
    pub kind: ArtifactKind,

    /// Input keys that receive the uploaded image as a data URL
    #[serde(default = "default_image_fields")]
    pub image_fields: Vec<String>,

    /// Inputs that must be present before anything is submitted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<RequiredInput>,

    /// Extra input parameters sent with every submission
    #[serde(default)]
    pub defaults: Map<String, Value>,

    /// Overrides `polling.interval_ms` for this preset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,

    /// Overrides `polling.max_attempts` for this preset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

fn default_image_fields() -> Vec<String> {
    vec!["image".to_string()]
}

impl PresetConfig {
    fn new(candidates: &[&str], kind: ArtifactKind) -> Self {
        Self {
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
            kind,
            image_fields: default_image_fields(),
            requires: Vec::new(),
            defaults: Map::new(),
            poll_interval_ms: None,
            max_attempts: None,
        }
    }

    fn with_image_fields(mut self, fields: &[&str]) -> Self {
        self.image_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    fn requiring(mut self, input: RequiredInput) -> Self {
        self.requires.push(input);
        self
    }

    /// Reject a job missing an input this preset requires.
    pub fn check_inputs(&self, has_prompt: bool, has_image: bool) -> Result<(), JobError> {
        for required in &self.requires {
            match required {
                RequiredInput::Prompt if !has_prompt => {
                    return Err(JobError::InvalidRequest("Prompt is required".into()));
                }
                RequiredInput::Image if !has_image => {
                    return Err(JobError::InvalidRequest("No image file provided".into()));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn with_default(mut self, key: &str, value: Value) -> Self {
        self.defaults.insert(key.to_string(), value);
        self
    }
}

/// Presets shipped with mediarelay.
///
/// Model names on the vendor side are unversioned and change without notice,
/// so each preset lists every spelling known to work at some point.
pub fn builtin_presets() -> BTreeMap<String, PresetConfig> {
    let image_aliases = ["image", "image_url", "input_image"];

    let mut presets = BTreeMap::new();
    presets.insert(
        "enhance-product".to_string(),
        PresetConfig::new(
            &[
                "flux-1-context",
                "flux-context",
                "flux/context",
                "4o-image",
                "4o-image-api",
                "nano-banana",
            ],
            ArtifactKind::Image,
        )
        .with_image_fields(&["image", "image_url", "input_image", "reference_image"])
        .requiring(RequiredInput::Image),
    );
    presets.insert(
        "enhance-quality".to_string(),
        PresetConfig::new(
            &[
                "4o-image-upscale",
                "flux-upscale",
                "flux-1-upscale",
                "upscale",
                "image-upscale",
                "super-resolution",
                "4o-image",
                "flux-context",
            ],
            ArtifactKind::Image,
        )
        .with_image_fields(&image_aliases)
        .requiring(RequiredInput::Image)
        .with_default("scale", Value::from(2))
        .with_default("upscale_factor", Value::from(2))
        .with_default("enhance", Value::Bool(true))
        .with_default("remove_noise", Value::Bool(true))
        .with_default("improve_quality", Value::Bool(true)),
    );
    presets.insert(
        "generate-video".to_string(),
        PresetConfig::new(
            &[
                "wan2.6/text-to-video",
                "wan-2.6/t2v",
                "wan/2.6-text-to-video",
                "alibaba/wan-2.6-t2v",
                "wan-2.6-t2v",
                "wan/t2v",
            ],
            ArtifactKind::Video,
        )
        .requiring(RequiredInput::Prompt)
        .with_default("duration", Value::from("5"))
        .with_default("resolution", Value::from("1080p")),
    );
    presets.insert(
        "remove-background".to_string(),
        PresetConfig::new(&["recraft/remove-background"], ArtifactKind::Image)
            .requiring(RequiredInput::Image),
    );
    presets
}
