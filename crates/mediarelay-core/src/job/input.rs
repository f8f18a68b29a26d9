//! Building vendor input mappings from uploads, prompts, and preset defaults.

use crate::config::PresetConfig;
use crate::error::JobError;
use base64::Engine;
use serde_json::{Map, Value};
use std::path::Path;

/// Base64-encoded image ready to embed in a job input.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes and format string.
    ///
    /// The format is the image format identifier (e.g., "jpeg", "png", "webp").
    pub fn from_bytes(bytes: &[u8], format: &str) -> Self {
        let media_type = match format.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            other => {
                tracing::warn!("Unknown image format '{other}', defaulting to image/jpeg");
                "image/jpeg"
            }
        };

        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }

    /// Read an image file, inferring its format from the extension.
    ///
    /// Files larger than `max_bytes` are rejected before being read.
    pub async fn from_path(path: &Path, max_bytes: u64) -> Result<Self, JobError> {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            JobError::InvalidRequest(format!("Cannot read {}: {e}", path.display()))
        })?;
        if metadata.len() > max_bytes {
            return Err(JobError::InvalidRequest(format!(
                "{} is {} bytes, above the {max_bytes} byte upload limit",
                path.display(),
                metadata.len()
            )));
        }

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            JobError::InvalidRequest(format!("Cannot read {}: {e}", path.display()))
        })?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Ok(Self::from_bytes(&bytes, format))
    }

    /// Return a data URL (`data:<mime>;base64,<data>`).
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// Input mapping for one job, layered as preset defaults, then caller
/// parameters, then prompt and image.
#[derive(Debug, Clone, Default)]
pub struct JobInput {
    params: Map<String, Value>,
}

impl JobInput {
    /// Start from a preset's default parameters.
    pub fn from_preset(preset: &PresetConfig) -> Self {
        Self {
            params: preset.defaults.clone(),
        }
    }

    /// Set one parameter, overriding any default.
    pub fn param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Parse a `key=value` CLI parameter. Values that parse as JSON
    /// (numbers, booleans, quoted strings) keep their type; anything else is
    /// sent as a string.
    pub fn param_str(self, pair: &str) -> Result<Self, JobError> {
        let (key, raw) = pair.split_once('=').ok_or_else(|| {
            JobError::InvalidRequest(format!("Parameter '{pair}' must look like key=value"))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(JobError::InvalidRequest(format!(
                "Parameter '{pair}' has an empty key"
            )));
        }
        let value = serde_json::from_str(raw.trim()).unwrap_or_else(|_| Value::from(raw.trim()));
        Ok(self.param(key, value))
    }

    pub fn prompt(self, prompt: Option<&str>) -> Self {
        match prompt.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => self.param("prompt", Value::from(p)),
            None => self,
        }
    }

    /// Attach the image under every key the preset lists.
    pub fn image(mut self, image: &ImageInput, fields: &[String]) -> Self {
        let url = image.data_url();
        for field in fields {
            self.params.insert(field.clone(), Value::from(url.clone()));
        }
        self
    }

    /// Whether a non-null value is set for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.params.get(key).is_some_and(|v| !v.is_null())
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.params
    }
}
