//! Data types shared by the job submitter, poller, and normalizer.

use crate::error::{JobError, JobResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{Duration, SystemTime};

/// Kind of artifact a job produces. Decides the caller-facing field name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    #[default]
    Image,
    Video,
}

/// A job to submit: candidate models plus the vendor input mapping.
#[derive(Debug, Clone)]
pub struct JobRequest {
    candidates: Vec<String>,
    input: Map<String, Value>,
    poll: PollOptions,
}

impl JobRequest {
    /// Build a request, rejecting an empty candidate list or a zero poll budget.
    pub fn new(
        candidates: Vec<String>,
        input: Map<String, Value>,
        poll_interval_ms: u64,
        max_attempts: u32,
    ) -> JobResult<Self> {
        let candidates: Vec<String> = candidates
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if candidates.is_empty() {
            return Err(JobError::InvalidRequest(
                "at least one candidate model is required".into(),
            ));
        }
        let poll = PollOptions::new(poll_interval_ms, max_attempts)?;
        Ok(Self {
            candidates,
            input,
            poll,
        })
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn input(&self) -> &Map<String, Value> {
        &self.input
    }

    pub fn poll_options(&self) -> PollOptions {
        self.poll
    }
}

/// Fixed-interval polling budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Delay between two status checks
    pub interval: Duration,
    /// Maximum number of status checks
    pub max_attempts: u32,
}

impl PollOptions {
    pub fn new(interval_ms: u64, max_attempts: u32) -> JobResult<Self> {
        if interval_ms == 0 {
            return Err(JobError::InvalidRequest(
                "poll interval must be > 0".into(),
            ));
        }
        if max_attempts == 0 {
            return Err(JobError::InvalidRequest("max attempts must be > 0".into()));
        }
        Ok(Self {
            interval: Duration::from_millis(interval_ms),
            max_attempts,
        })
    }
}

/// Handle to a job accepted by the vendor.
#[derive(Debug, Clone, PartialEq)]
pub struct JobHandle {
    id: String,
    model: String,
    submitted_at: SystemTime,
}

impl JobHandle {
    pub fn new(id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            submitted_at: SystemTime::now(),
        }
    }

    /// Vendor-assigned task ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Candidate model that accepted the job. Empty for handles rebuilt from a bare ID.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn submitted_at(&self) -> SystemTime {
        self.submitted_at
    }
}

/// Final artifact of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultPayload {
    /// Remote URL of the artifact
    Url(String),
    /// Inline `data:<mime>;base64,...` URL
    Inline(String),
}

impl ResultPayload {
    /// Classify a raw result string.
    pub fn from_value(value: &str) -> Self {
        let value = value.trim();
        if value.starts_with("data:") {
            Self::Inline(value.to_string())
        } else {
            Self::Url(value.to_string())
        }
    }

    /// The artifact as a URL string (remote or data URL).
    pub fn as_str(&self) -> &str {
        match self {
            Self::Url(s) | Self::Inline(s) => s,
        }
    }
}

/// Status of a job as reported by one poll.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Processing { progress: Option<String> },
    Completed(ResultPayload),
    Failed { reason: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Processing { .. })
    }
}

/// Successful outcome of the submission step.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The job was queued; poll the handle for the result.
    Pending(JobHandle),
    /// The vendor answered synchronously with the artifact.
    Completed {
        model: String,
        result: ResultPayload,
    },
}

/// Caller-facing job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Processing,
    Completed,
    Failed,
}

/// Caller-facing result of a submit, status check, or full run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    pub status: OutcomeStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Image artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Video artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,

    /// Input the job was built from (file name), set by batch runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl JobOutcome {
    fn empty(status: OutcomeStatus) -> Self {
        Self {
            status,
            task_id: None,
            model: None,
            url: None,
            video_url: None,
            error: None,
            progress: None,
            source: None,
        }
    }

    pub fn processing(handle: &JobHandle, progress: Option<String>) -> Self {
        let mut outcome = Self::empty(OutcomeStatus::Processing);
        outcome.task_id = Some(handle.id().to_string());
        if !handle.model().is_empty() {
            outcome.model = Some(handle.model().to_string());
        }
        outcome.progress = progress;
        outcome
    }

    pub fn completed(result: &ResultPayload, kind: ArtifactKind) -> Self {
        let mut outcome = Self::empty(OutcomeStatus::Completed);
        match kind {
            ArtifactKind::Image => outcome.url = Some(result.as_str().to_string()),
            ArtifactKind::Video => outcome.video_url = Some(result.as_str().to_string()),
        }
        outcome
    }

    pub fn failed(error: &JobError) -> Self {
        let mut outcome = Self::empty(OutcomeStatus::Failed);
        outcome.error = Some(error.to_string());
        outcome
    }

    /// Build the outcome of a single status check.
    pub fn from_status(handle: &JobHandle, status: JobStatus, kind: ArtifactKind) -> Self {
        let mut outcome = match status {
            JobStatus::Processing { progress } => return Self::processing(handle, progress),
            JobStatus::Completed(result) => Self::completed(&result, kind),
            JobStatus::Failed { reason } => Self::failed(&JobError::Provider { reason }),
        };
        outcome.task_id = Some(handle.id().to_string());
        outcome
    }

    pub fn with_task_id(mut self, id: impl Into<String>) -> Self {
        self.task_id = Some(id.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        if !model.is_empty() {
            self.model = Some(model);
        }
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The artifact URL, whichever field carries it.
    pub fn artifact(&self) -> Option<&str> {
        self.url.as_deref().or(self.video_url.as_deref())
    }

    pub fn is_failed(&self) -> bool {
        self.status == OutcomeStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_request_rejects_empty_candidates() {
        let err = JobRequest::new(vec![], Map::new(), 1000, 5).unwrap_err();
        assert!(matches!(err, JobError::InvalidRequest(_)));

        let err = JobRequest::new(vec!["  ".into()], Map::new(), 1000, 5).unwrap_err();
        assert!(matches!(err, JobError::InvalidRequest(_)));
    }

    #[test]
    fn test_job_request_rejects_zero_budget() {
        assert!(JobRequest::new(vec!["m".into()], Map::new(), 0, 5).is_err());
        assert!(JobRequest::new(vec!["m".into()], Map::new(), 10, 0).is_err());
    }

    #[test]
    fn test_job_request_keeps_candidate_order() {
        let request = JobRequest::new(
            vec!["b".into(), "a".into(), "c".into()],
            Map::new(),
            10,
            3,
        )
        .unwrap();
        assert_eq!(request.candidates(), ["b", "a", "c"]);
        assert_eq!(request.poll_options().interval, Duration::from_millis(10));
    }

    #[test]
    fn test_result_payload_classification() {
        assert_eq!(
            ResultPayload::from_value("https://x/y.png"),
            ResultPayload::Url("https://x/y.png".into())
        );
        assert!(matches!(
            ResultPayload::from_value("data:image/png;base64,AAAA"),
            ResultPayload::Inline(_)
        ));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::Processing { progress: None }.is_terminal());
        assert!(JobStatus::Failed {
            reason: "x".into()
        }
        .is_terminal());
        assert!(JobStatus::Completed(ResultPayload::Url("u".into())).is_terminal());
    }

    #[test]
    fn test_outcome_serializes_video_url_camel_case() {
        let outcome = JobOutcome::completed(
            &ResultPayload::Url("https://x/v.mp4".into()),
            ArtifactKind::Video,
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["videoUrl"], "https://x/v.mp4");
        assert!(json.get("url").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_outcome_failed_carries_reason() {
        let outcome = JobOutcome::failed(&JobError::Provider {
            reason: "oom".into(),
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "oom");
    }

    #[test]
    fn test_outcome_processing_has_task_id() {
        let handle = JobHandle::new("abc", "flux-context");
        let outcome = JobOutcome::processing(&handle, Some("40%".into()));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["taskId"], "abc");
        assert_eq!(json["model"], "flux-context");
        assert_eq!(json["progress"], "40%");
    }
}
