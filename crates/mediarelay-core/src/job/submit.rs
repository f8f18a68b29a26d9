//! Job submission with ordered fallback over candidate models.
//!
//! Vendor model names are unversioned and drift between naming schemes, so a
//! request carries a ranked list of candidates. Each one is tried in order
//! until the vendor accepts the job; "model not found" answers move on to
//! the next candidate.

use super::backend::JobBackend;
use super::normalize;
use super::types::{JobHandle, JobRequest, Submission};
use crate::error::{JobError, JobResult};
use serde_json::Value;

/// Reason reported when every candidate failed without a recorded error.
pub const EXHAUSTED_REASON: &str = "all candidate models exhausted";

/// Message fragments that mark an unknown model identifier.
const UNKNOWN_MODEL_MARKERS: &[&str] = &["not exist", "not published", "not found"];

/// How a submission response should be treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseClass {
    /// The vendor accepted the request
    Accepted,
    /// The vendor does not know the model; try the next candidate
    UnknownIdentifier(String),
    /// Any other in-band error
    Rejected(String),
}

/// Classify a parsed submission response by its `code` and message.
///
/// A missing, null, false, empty, zero, or 200 code is success. String
/// codes other than the empty string are errors.
pub fn classify(response: &Value) -> ResponseClass {
    let ok = match response.get("code") {
        None | Some(Value::Null) => true,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|c| c == 0.0 || c == 200.0),
        // Only the numeric codes count; "200" as a string is an error code.
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Bool(b)) => !b,
        Some(_) => false,
    };
    if ok {
        return ResponseClass::Accepted;
    }

    let message = response
        .get("msg")
        .or_else(|| response.get("message"))
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or("unknown provider error")
        .to_string();

    let lowered = message.to_ascii_lowercase();
    if UNKNOWN_MODEL_MARKERS.iter().any(|m| lowered.contains(m)) {
        ResponseClass::UnknownIdentifier(message)
    } else {
        ResponseClass::Rejected(message)
    }
}

/// Submit a job, trying each candidate model in order.
///
/// Stops at the first accepted candidate. Returns a [`Submission::Pending`]
/// handle when the vendor queued the job, or [`Submission::Completed`] when
/// the response already carries the artifact.
pub async fn submit(backend: &dyn JobBackend, request: &JobRequest) -> JobResult<Submission> {
    let mut last_error: Option<JobError> = None;

    for model in request.candidates() {
        tracing::debug!("Trying model {model} on {}", backend.name());

        let response = match backend.create_task(model, request.input()).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Submission to {model} failed: {e}");
                last_error = Some(e);
                continue;
            }
        };

        match classify(&response) {
            ResponseClass::Accepted => {
                tracing::info!("Job accepted by model {model}");
                return accepted(model, &response);
            }
            ResponseClass::UnknownIdentifier(message) => {
                tracing::debug!("Model {model} not available: {message}");
                last_error = Some(JobError::UnknownIdentifier {
                    model: model.clone(),
                    message,
                });
            }
            ResponseClass::Rejected(message) => {
                tracing::warn!("Model {model} rejected the job: {message}");
                last_error = Some(JobError::Provider { reason: message });
            }
        }
    }

    Err(JobError::CandidatesExhausted {
        reason: last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| EXHAUSTED_REASON.to_string()),
    })
}

/// Turn an accepted response into a handle or an immediate result.
fn accepted(model: &str, response: &Value) -> JobResult<Submission> {
    if let Some(id) = normalize::extract_job_id(response) {
        return Ok(Submission::Pending(JobHandle::new(id, model)));
    }
    match normalize::find_result(response) {
        Some(result) => {
            tracing::info!("Model {model} returned a synchronous result");
            Ok(Submission::Completed {
                model: model.to_string(),
                result,
            })
        }
        None => Err(JobError::MissingJobId),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::testing::MockBackend;
    use crate::job::types::ResultPayload;
    use serde_json::{json, Map};

    fn request(candidates: &[&str]) -> JobRequest {
        JobRequest::new(
            candidates.iter().map(|c| c.to_string()).collect(),
            Map::new(),
            1,
            3,
        )
        .unwrap()
    }

    #[test]
    fn test_classify_success_codes() {
        assert_eq!(classify(&json!({"data": {}})), ResponseClass::Accepted);
        assert_eq!(classify(&json!({"code": 0})), ResponseClass::Accepted);
        assert_eq!(classify(&json!({"code": 200})), ResponseClass::Accepted);
        assert_eq!(classify(&json!({"code": null})), ResponseClass::Accepted);
    }

    #[test]
    fn test_classify_non_numeric_codes() {
        assert_eq!(classify(&json!({"code": ""})), ResponseClass::Accepted);
        assert_eq!(classify(&json!({"code": false})), ResponseClass::Accepted);
        assert_eq!(classify(&json!({"code": 200.0})), ResponseClass::Accepted);
        for code in [json!("200"), json!("0"), json!(true), json!([200])] {
            assert!(
                matches!(
                    classify(&json!({"code": code.clone(), "msg": "rejected"})),
                    ResponseClass::Rejected(_)
                ),
                "{code}"
            );
        }
    }

    #[test]
    fn test_classify_unknown_model() {
        for msg in [
            "The page does not exist",
            "Model not published",
            "model NOT FOUND",
        ] {
            assert!(matches!(
                classify(&json!({"code": 404, "msg": msg})),
                ResponseClass::UnknownIdentifier(_)
            ));
        }
    }

    #[test]
    fn test_classify_other_error() {
        assert_eq!(
            classify(&json!({"code": 401, "msg": "bad key"})),
            ResponseClass::Rejected("bad key".into())
        );
        assert_eq!(
            classify(&json!({"code": 500})),
            ResponseClass::Rejected("unknown provider error".into())
        );
    }

    #[tokio::test]
    async fn test_returns_handle() {
        let backend = MockBackend::new().on_create("m1", Ok(json!({"code": 0, "data": {"id": "abc"}})));
        let submission = submit(&backend, &request(&["m1"])).await.unwrap();
        match submission {
            Submission::Pending(handle) => {
                assert_eq!(handle.id(), "abc");
                assert_eq!(handle.model(), "m1");
            }
            other => panic!("expected pending handle, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_direct_result_bypasses_polling() {
        let backend =
            MockBackend::new().on_create("m1", Ok(json!({"data": {"output": "https://x/y.png"}})));
        let submission = submit(&backend, &request(&["m1"])).await.unwrap();
        assert_eq!(
            submission,
            Submission::Completed {
                model: "m1".into(),
                result: ResultPayload::Url("https://x/y.png".into()),
            }
        );
        assert_eq!(backend.poll_count(), 0);
    }

    #[tokio::test]
    async fn test_stops_at_first_success() {
        let backend = MockBackend::new()
            .on_create("a", Ok(json!({"code": 404, "msg": "model does not exist"})))
            .on_create("b", Ok(json!({"code": 0, "data": {"taskId": "t-2"}})))
            .on_create("c", Ok(json!({"code": 0, "data": {"taskId": "t-3"}})));

        let submission = submit(&backend, &request(&["a", "b", "c"])).await.unwrap();
        assert!(matches!(submission, Submission::Pending(ref h) if h.id() == "t-2"));
        assert_eq!(backend.created_models(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_skips_unparsable_and_failed_candidates() {
        let backend = MockBackend::new()
            .on_create("a", Err(JobError::transient("Invalid JSON: <html>")))
            .on_create("b", Ok(json!({"code": 500, "msg": "busy"})))
            .on_create("c", Ok(json!({"data": {"id": 7}})));

        let submission = submit(&backend, &request(&["a", "b", "c"])).await.unwrap();
        assert!(matches!(submission, Submission::Pending(ref h) if h.id() == "7"));
        assert_eq!(backend.created_models(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_exhausted_reports_last_error() {
        let backend = MockBackend::new()
            .on_create("a", Ok(json!({"code": 401, "msg": "bad key"})))
            .on_create("b", Ok(json!({"code": 404, "msg": "not found"})));

        let err = submit(&backend, &request(&["a", "b"])).await.unwrap_err();
        match err {
            JobError::CandidatesExhausted { reason } => {
                assert!(reason.contains("'b'"), "got: {reason}");
                assert!(reason.contains("not found"), "got: {reason}");
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exhausted_surfaces_last_rejection_verbatim() {
        let backend = MockBackend::new().on_create("a", Ok(json!({"code": 402, "msg": "credits"})));
        let err = submit(&backend, &request(&["a"])).await.unwrap_err();
        assert_eq!(err.to_string(), "credits");
    }

    #[tokio::test]
    async fn test_accepted_without_id_or_result() {
        let backend = MockBackend::new().on_create("a", Ok(json!({"code": 0, "data": {}})));
        let err = submit(&backend, &request(&["a", "b"])).await.unwrap_err();
        assert_eq!(err, JobError::MissingJobId);
        assert_eq!(backend.created_models(), vec!["a"]);
    }
}
