//! Error types for mediarelay.
//!
//! Job errors follow the failure classes of the vendor job protocol so that
//! callers can tell a provider failure from a timeout or a malformed result.

use thiserror::Error;

/// Top-level error type for mediarelay operations.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Job submission / polling errors
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// A vendor API key is required but not configured
    #[error("{service} API key not set. Set {env_var} or `{service}.api_key` in the config file.")]
    MissingApiKey {
        service: &'static str,
        env_var: &'static str,
    },

    /// No preset with this name exists
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),
}

/// Errors raised while submitting, polling, or normalizing a vendor job.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobError {
    /// A single request failed in a way that may succeed on the next attempt
    /// (network failure, non-2xx status, unparsable body).
    #[error("{message}")]
    Transient {
        message: String,
        status_code: Option<u16>,
    },

    /// The vendor does not know this model identifier.
    #[error("Model '{model}' not available: {message}")]
    UnknownIdentifier { model: String, message: String },

    /// The vendor reported the job as failed.
    #[error("{reason}")]
    Provider { reason: String },

    /// The poll budget ran out before the job reached a terminal state.
    #[error("Timed out waiting for job {job_id} after {attempts} attempts")]
    Timeout { job_id: String, attempts: u32 },

    /// The job finished but no result could be extracted from the response.
    #[error("No result found in provider response")]
    NoResult,

    /// Every candidate model was tried without success.
    #[error("{reason}")]
    CandidatesExhausted { reason: String },

    /// Submission was accepted but carried neither a job id nor a result.
    #[error("No task ID in provider response")]
    MissingJobId,

    /// The request itself is malformed.
    #[error("Invalid job request: {0}")]
    InvalidRequest(String),

    /// A chat completion call failed.
    #[error("{message}")]
    Chat {
        message: String,
        status_code: Option<u16>,
    },
}

impl JobError {
    pub(crate) fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
            status_code: None,
        }
    }
}

/// Convenience type alias for mediarelay results.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Convenience type alias for job-level results.
pub type JobResult<T> = std::result::Result<T, JobError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_message_names_env_var() {
        let err = ConfigError::MissingApiKey {
            service: "kie",
            env_var: "KIE_API_KEY",
        };
        let msg = err.to_string();
        assert!(msg.contains("KIE_API_KEY"));
        assert!(msg.contains("kie.api_key"));
    }

    #[test]
    fn test_provider_error_displays_reason_verbatim() {
        let err = JobError::Provider {
            reason: "oom".to_string(),
        };
        assert_eq!(err.to_string(), "oom");
    }

    #[test]
    fn test_timeout_distinct_from_provider_failure() {
        let err = JobError::Timeout {
            job_id: "abc".to_string(),
            attempts: 5,
        };
        assert!(err.to_string().contains("abc"));
        assert!(err.to_string().contains("5 attempts"));
    }
}
