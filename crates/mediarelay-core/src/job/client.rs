//! Caller-facing job operations: submit, check, and run to completion.
//!
//! Every operation returns a [`JobOutcome`]. Errors are folded into
//! `{status: "failed", error}` rather than propagated, so one failing job
//! never takes the caller down with it.

use super::backend::JobBackend;
use super::poll;
use super::submit;
use super::types::{ArtifactKind, JobHandle, JobOutcome, JobRequest, JobStatus, Submission};
use crate::config::{PollingConfig, PresetConfig};
use crate::error::JobResult;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Build a [`JobRequest`] from a preset, falling back to the global polling settings.
pub fn request_for(
    preset: &PresetConfig,
    polling: &PollingConfig,
    input: Map<String, Value>,
) -> JobResult<JobRequest> {
    JobRequest::new(
        preset.candidates.clone(),
        input,
        preset.poll_interval_ms.unwrap_or(polling.interval_ms),
        preset.max_attempts.unwrap_or(polling.max_attempts),
    )
}

/// Job operations over a shared backend.
#[derive(Clone)]
pub struct JobClient {
    backend: Arc<dyn JobBackend>,
}

impl JobClient {
    pub fn new(backend: Arc<dyn JobBackend>) -> Self {
        Self { backend }
    }

    /// Submit without waiting. A synchronous result is returned as completed.
    pub async fn submit(&self, request: &JobRequest, kind: ArtifactKind) -> JobOutcome {
        match submit::submit(self.backend.as_ref(), request).await {
            Ok(Submission::Pending(handle)) => JobOutcome::processing(&handle, None),
            Ok(Submission::Completed { model, result }) => {
                JobOutcome::completed(&result, kind).with_model(model)
            }
            Err(e) => {
                tracing::error!("Submission failed: {e}");
                JobOutcome::failed(&e)
            }
        }
    }

    /// Check a previously submitted job once.
    pub async fn status(&self, task_id: &str, kind: ArtifactKind) -> JobOutcome {
        let handle = JobHandle::new(task_id, "");
        match poll::check_status(self.backend.as_ref(), &handle).await {
            Ok(status) => JobOutcome::from_status(&handle, status, kind),
            Err(e) => JobOutcome::failed(&e).with_task_id(task_id),
        }
    }

    /// Submit and poll until the job reaches a terminal state.
    pub async fn run(&self, request: &JobRequest, kind: ArtifactKind) -> JobOutcome {
        self.run_with_progress(request, kind, |_, _| {}).await
    }

    /// Like [`JobClient::run`], reporting every poll attempt to `on_attempt`.
    pub async fn run_with_progress<F>(
        &self,
        request: &JobRequest,
        kind: ArtifactKind,
        on_attempt: F,
    ) -> JobOutcome
    where
        F: FnMut(u32, Option<&JobStatus>) + Send,
    {
        let handle = match submit::submit(self.backend.as_ref(), request).await {
            Ok(Submission::Pending(handle)) => handle,
            Ok(Submission::Completed { model, result }) => {
                return JobOutcome::completed(&result, kind).with_model(model);
            }
            Err(e) => {
                tracing::error!("Submission failed: {e}");
                return JobOutcome::failed(&e);
            }
        };

        let polled = poll::poll_with_progress(
            self.backend.as_ref(),
            &handle,
            request.poll_options(),
            on_attempt,
        )
        .await;

        let outcome = match polled {
            Ok(result) => JobOutcome::completed(&result, kind),
            Err(e) => {
                tracing::error!("Job {} did not complete: {e}", handle.id());
                JobOutcome::failed(&e)
            }
        };
        outcome.with_task_id(handle.id()).with_model(handle.model())
    }
}
