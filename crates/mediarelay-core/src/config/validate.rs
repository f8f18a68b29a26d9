//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "polling.interval_ms must be > 0".into(),
            ));
        }
        if self.polling.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "polling.max_attempts must be > 0".into(),
            ));
        }
        if self.kie.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "kie.timeout_ms must be > 0".into(),
            ));
        }
        if !self.kie.status_path.contains("{id}") {
            return Err(ConfigError::ValidationError(
                "kie.status_path must contain an {id} placeholder".into(),
            ));
        }
        if self.groq.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "groq.timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.max_upload_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_upload_mb must be > 0".into(),
            ));
        }
        for (name, preset) in &self.presets {
            if preset.candidates.iter().all(|c| c.trim().is_empty()) {
                return Err(ConfigError::ValidationError(format!(
                    "presets.{name}.candidates must list at least one model"
                )));
            }
            if preset.poll_interval_ms == Some(0) {
                return Err(ConfigError::ValidationError(format!(
                    "presets.{name}.poll_interval_ms must be > 0"
                )));
            }
            if preset.max_attempts == Some(0) {
                return Err(ConfigError::ValidationError(format!(
                    "presets.{name}.max_attempts must be > 0"
                )));
            }
        }
        Ok(())
    }
}
