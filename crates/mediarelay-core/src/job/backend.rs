//! Vendor job API abstraction.

use crate::error::JobError;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Transport to an asynchronous job API.
///
/// Implementations return the parsed response body and leave its
/// interpretation (error codes, status strings, result fields) to the
/// submitter and poller. A body that is not JSON, or a transport failure,
/// is reported as [`JobError::Transient`].
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the batch runner shares an `Arc<dyn JobBackend>` across tasks).
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Backend name for logging (e.g., "kie").
    fn name(&self) -> &str;

    /// Create a task for `model` with the given input mapping.
    async fn create_task(&self, model: &str, input: &Map<String, Value>) -> Result<Value, JobError>;

    /// Fetch the current state of a task.
    async fn get_task(&self, id: &str) -> Result<Value, JobError>;
}
