//! Configuration management for mediarelay.
//!
//! Configuration is loaded from the platform config directory with built-in
//! defaults. API keys are never baked in: they are read from the file or from
//! `${ENV_VAR}` references and checked before the first request is made.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Root configuration structure for mediarelay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Kie.ai job API settings
    pub kie: KieConfig,

    /// Groq chat settings
    pub groq: GroqConfig,

    /// Default polling cadence
    pub polling: PollingConfig,

    /// Upload limits
    pub limits: LimitsConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Job presets, keyed by name
    pub presets: BTreeMap<String, PresetConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kie: KieConfig::default(),
            groq: GroqConfig::default(),
            polling: PollingConfig::default(),
            limits: LimitsConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
            presets: builtin_presets(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    ///
    /// Built-in presets not redefined by the file are kept.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content)?;
        for (name, preset) in builtin_presets() {
            config.presets.entry(name).or_insert(preset);
        }
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.mediarelay.mediarelay/config.toml
    /// - Linux: ~/.config/mediarelay/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\mediarelay\config\config.toml
    ///
    /// Falls back to ~/.mediarelay/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "mediarelay", "mediarelay")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = shellexpand::tilde("~").into_owned();
                PathBuf::from(home).join(".mediarelay").join("config.toml")
            })
    }

    /// Look up a preset by name.
    pub fn preset(&self, name: &str) -> Result<&PresetConfig, ConfigError> {
        self.presets
            .get(name)
            .ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))
    }

    /// Resolve the Kie.ai API key, failing if it is not configured.
    pub fn kie_api_key(&self) -> Result<String, ConfigError> {
        resolve_env_var(&self.kie.api_key).ok_or(ConfigError::MissingApiKey {
            service: "kie",
            env_var: "KIE_API_KEY",
        })
    }

    /// Resolve the Groq API key, failing if it is not configured.
    pub fn groq_api_key(&self) -> Result<String, ConfigError> {
        resolve_env_var(&self.groq.api_key).ok_or(ConfigError::MissingApiKey {
            service: "groq",
            env_var: "GROQ_API_KEY",
        })
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
///
/// Empty strings and unset variables resolve to `None`.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
