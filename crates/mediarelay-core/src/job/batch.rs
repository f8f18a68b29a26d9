//! Concurrent execution of independent jobs.
//!
//! Each job runs its own submit-and-poll cycle in a tokio task. A semaphore
//! bounds how many are in flight; nothing else is shared between them.
//! Outcomes are delivered via a callback as they complete, enabling real-time
//! JSONL streaming.

use super::client::JobClient;
use super::types::{ArtifactKind, JobOutcome, JobRequest};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// One entry of a batch: a request plus a label identifying its input.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub source: String,
    pub request: JobRequest,
}

/// Runs many jobs against one backend with bounded concurrency.
pub struct BatchRunner {
    client: JobClient,
    kind: ArtifactKind,
    parallel: usize,
}

impl BatchRunner {
    pub fn new(client: JobClient, kind: ArtifactKind, parallel: usize) -> Self {
        Self {
            client,
            kind,
            parallel: parallel.max(1),
        }
    }

    /// Run every job, calling `on_outcome` as each one finishes.
    ///
    /// Returns `(succeeded, failed)` counts.
    pub async fn run<F>(&self, jobs: Vec<BatchJob>, on_outcome: F) -> (usize, usize)
    where
        F: Fn(JobOutcome) + Send + Sync + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.parallel));
        let on_outcome = Arc::new(on_outcome);
        let mut handles = Vec::with_capacity(jobs.len());

        for job in jobs {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::warn!("Batch semaphore closed unexpectedly, stopping batch");
                    break;
                }
            };

            let client = self.client.clone();
            let kind = self.kind;
            let on_outcome = on_outcome.clone();

            let handle = tokio::spawn(async move {
                tracing::debug!("Starting job for {}", job.source);
                let outcome = client
                    .run(&job.request, kind)
                    .await
                    .with_source(job.source);
                let success = !outcome.is_failed();
                drop(permit); // Release concurrency permit before callback
                on_outcome(outcome);
                success
            });

            handles.push(handle);
        }

        let mut succeeded = 0usize;
        let mut failed = 0usize;

        for handle in handles {
            match handle.await {
                Ok(true) => succeeded += 1,
                Ok(false) => failed += 1,
                Err(e) => {
                    tracing::error!("Batch job panicked: {e}");
                    failed += 1;
                }
            }
        }

        (succeeded, failed)
    }
}
