//! Result extraction from inconsistently shaped vendor responses.
//!
//! Vendors put the artifact under different keys, sometimes wrapped in a
//! `data` envelope, sometimes as an object or an array of URLs. All of that
//! is collapsed here into one [`ResultPayload`].

use super::types::ResultPayload;
use crate::error::{JobError, JobResult};
use serde_json::Value;

/// Result fields in priority order.
pub const RESULT_FIELDS: &[&str] = &["output", "url", "image", "video"];

/// Keys searched inside a non-string result object.
const NESTED_FIELDS: &[&str] = &["url", "image", "video"];

/// Job ID fields in priority order.
const JOB_ID_FIELDS: &[&str] = &["id", "taskId", "job_id"];

/// Nesting levels followed when coercing objects and arrays.
const MAX_DEPTH: usize = 4;

/// Extract the canonical result from a response.
pub fn extract_result(response: &Value) -> JobResult<ResultPayload> {
    find_result(response).ok_or(JobError::NoResult)
}

/// Like [`extract_result`], but `None` when nothing usable is present.
pub fn find_result(response: &Value) -> Option<ResultPayload> {
    let data = response.get("data");
    RESULT_FIELDS
        .iter()
        .flat_map(|field| {
            [
                data.and_then(|d| d.get(*field)),
                response.get(*field),
            ]
        })
        .flatten()
        .find_map(|value| coerce(value, 0))
        .map(|s| ResultPayload::from_value(&s))
}

/// Turn a result value into a usable string, descending into objects and arrays.
fn coerce(value: &Value, depth: usize) -> Option<String> {
    if depth > MAX_DEPTH {
        return None;
    }
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Array(items) => items.first().and_then(|first| coerce(first, depth + 1)),
        Value::Object(map) => NESTED_FIELDS
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(|v| coerce(v, depth + 1)),
        _ => None,
    }
}

/// Extract the job ID from a submission response (`data` first, then top level).
pub fn extract_job_id(response: &Value) -> Option<String> {
    let data = response.get("data");
    [data, Some(response)]
        .into_iter()
        .flatten()
        .flat_map(|container| JOB_ID_FIELDS.iter().filter_map(move |f| container.get(*f)))
        .find_map(scalar_string)
}

/// Extract the status string (`data.status`, then `status`), lowercased.
pub fn extract_status(response: &Value) -> Option<String> {
    lookup(response, "status").map(|s| s.to_ascii_lowercase())
}

/// Extract a progress indicator (`data.progress`, then `progress`).
pub fn extract_progress(response: &Value) -> Option<String> {
    lookup(response, "progress")
}

/// Extract a failure reason from a failed-status response.
pub fn extract_failure_reason(response: &Value) -> Option<String> {
    ["error", "msg", "message"]
        .iter()
        .find_map(|field| lookup(response, field))
}

/// First non-empty scalar under `data.<field>` or `<field>`.
fn lookup(response: &Value, field: &str) -> Option<String> {
    response
        .get("data")
        .and_then(|d| d.get(field))
        .and_then(scalar_string)
        .or_else(|| response.get(field).and_then(scalar_string))
}

/// Strings as-is (if non-empty), numbers stringified.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
