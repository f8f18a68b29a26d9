//! Retry utilities for transient chat failures.
//!
//! Provides classification of retryable errors and exponential backoff.
//! Job polling does not use this: it waits a fixed interval instead.

use crate::error::JobError;
use std::time::Duration;

/// Determine whether a chat error is worth retrying.
///
/// Retryable errors: rate limits (429), server errors (5xx), timeouts and
/// connection failures. Non-retryable: auth failures, bad requests.
pub fn is_retryable(error: &JobError) -> bool {
    match error {
        JobError::Timeout { .. } => true,
        JobError::Chat {
            status_code,
            message,
        }
        | JobError::Transient {
            status_code,
            message,
        } => {
            // Classify by HTTP status code when available (structured)
            if let Some(code) = status_code {
                return *code == 429 || (500..=599).contains(code);
            }
            // Fallback for non-HTTP errors (e.g., connection refused, DNS failure)
            message.contains("timed out") || message.contains("connect")
        }
        _ => false,
    }
}

/// Calculate exponential backoff duration for a given attempt.
///
/// Uses `base_delay * 2^attempt` with a cap at 30 seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(30_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat_error(status_code: Option<u16>, message: &str) -> JobError {
        JobError::Chat {
            message: message.to_string(),
            status_code,
        }
    }

    #[test]
    fn test_rate_limit_is_retryable() {
        assert!(is_retryable(&chat_error(Some(429), "rate limit exceeded")));
    }

    #[test]
    fn test_server_error_is_retryable() {
        assert!(is_retryable(&chat_error(Some(503), "service unavailable")));
    }

    #[test]
    fn test_auth_error_not_retryable() {
        assert!(!is_retryable(&chat_error(Some(401), "unauthorized")));
    }

    #[test]
    fn test_provider_failure_not_retryable() {
        let err = JobError::Provider {
            reason: "oom".to_string(),
        };
        assert!(!is_retryable(&err));
    }

    #[test]
    fn test_message_with_500_in_body_not_retryable_without_status() {
        assert!(!is_retryable(&chat_error(None, "Processed 500 tokens successfully")));
    }

    #[test]
    fn test_connection_error_retryable_without_status() {
        assert!(is_retryable(&chat_error(None, "error trying to connect: refused")));
    }

    #[test]
    fn test_backoff_exponential() {
        assert_eq!(backoff_duration(0, 1000), Duration::from_millis(1000));
        assert_eq!(backoff_duration(1, 1000), Duration::from_millis(2000));
        assert_eq!(backoff_duration(3, 1000), Duration::from_millis(8000));
    }

    #[test]
    fn test_backoff_capped_at_30s() {
        assert_eq!(backoff_duration(10, 1000), Duration::from_millis(30_000));
    }
}
