//! Fixed-interval polling of queued jobs.
//!
//! A single failed poll (network error, non-2xx, malformed body) never aborts
//! the loop; it only uses up one attempt. Only an explicit failure status or
//! an exhausted budget ends polling early.

use super::backend::JobBackend;
use super::normalize;
use super::submit::{classify, ResponseClass};
use super::types::{JobHandle, JobStatus, PollOptions, ResultPayload};
use crate::error::{JobError, JobResult};
use serde_json::Value;

const COMPLETED_STATUSES: &[&str] = &["completed", "succeeded", "success", "done"];
const FAILED_STATUSES: &[&str] = &["failed", "error"];

/// Reason reported for a failed job that gave no explanation.
pub const DEFAULT_FAILURE_REASON: &str = "generation failed";

/// Map a status response onto a [`JobStatus`].
///
/// A terminal status string decides the outcome whatever the `code` field
/// says. Without one, an error-coded envelope is transient: the status
/// endpoint answers with the same `{code, msg}` shape as submission when it
/// cannot serve the lookup.
pub fn parse_status(response: &Value) -> JobResult<JobStatus> {
    let status = normalize::extract_status(response).unwrap_or_default();
    if COMPLETED_STATUSES.contains(&status.as_str()) {
        return normalize::extract_result(response).map(JobStatus::Completed);
    }
    if FAILED_STATUSES.contains(&status.as_str()) {
        let reason = normalize::extract_failure_reason(response)
            .unwrap_or_else(|| DEFAULT_FAILURE_REASON.to_string());
        return Ok(JobStatus::Failed { reason });
    }

    if let ResponseClass::UnknownIdentifier(message) | ResponseClass::Rejected(message) =
        classify(response)
    {
        return Err(JobError::transient(format!("Status lookup failed: {message}")));
    }
    Ok(JobStatus::Processing {
        progress: normalize::extract_progress(response),
    })
}

/// Query the job once.
pub async fn check_status(backend: &dyn JobBackend, handle: &JobHandle) -> JobResult<JobStatus> {
    let response = backend.get_task(handle.id()).await?;
    parse_status(&response)
}

/// Poll until the job completes, fails, or the attempt budget runs out.
pub async fn poll(
    backend: &dyn JobBackend,
    handle: &JobHandle,
    options: PollOptions,
) -> JobResult<ResultPayload> {
    poll_with_progress(backend, handle, options, |_, _| {}).await
}

/// Like [`poll`], calling `on_attempt(attempt, status)` after every attempt.
///
/// `status` is `None` for a skipped attempt. Attempts are numbered from 1.
pub async fn poll_with_progress<F>(
    backend: &dyn JobBackend,
    handle: &JobHandle,
    options: PollOptions,
    mut on_attempt: F,
) -> JobResult<ResultPayload>
where
    F: FnMut(u32, Option<&JobStatus>) + Send,
{
    for attempt in 1..=options.max_attempts {
        if attempt > 1 {
            tokio::time::sleep(options.interval).await;
        }

        match check_status(backend, handle).await {
            Ok(status) => {
                on_attempt(attempt, Some(&status));
                match status {
                    JobStatus::Completed(result) => {
                        tracing::info!("Job {} completed after {attempt} poll(s)", handle.id());
                        return Ok(result);
                    }
                    JobStatus::Failed { reason } => {
                        tracing::warn!("Job {} failed: {reason}", handle.id());
                        return Err(JobError::Provider { reason });
                    }
                    JobStatus::Processing { progress } => {
                        tracing::debug!(
                            "Job {} processing (attempt {attempt}/{}, progress {})",
                            handle.id(),
                            options.max_attempts,
                            progress.as_deref().unwrap_or("-")
                        );
                    }
                }
            }
            // Completed without a usable payload is a data-shape error, not a transient one
            Err(JobError::NoResult) => {
                on_attempt(attempt, None);
                return Err(JobError::NoResult);
            }
            Err(e) => {
                on_attempt(attempt, None);
                tracing::warn!(
                    "Poll {attempt}/{} for job {} skipped: {e}",
                    options.max_attempts,
                    handle.id()
                );
            }
        }
    }

    Err(JobError::Timeout {
        job_id: handle.id().to_string(),
        attempts: options.max_attempts,
    })
}
