//! Asynchronous vendor jobs: submission with model fallback, fixed-interval
//! polling, and result normalization.
//!
//! ```text
//! JobRequest → submit (candidate by candidate) → JobHandle → poll → normalize → JobOutcome
//!                                  └── synchronous result ───────────────────────┘
//! ```

pub(crate) mod backend;
pub(crate) mod batch;
pub(crate) mod client;
pub(crate) mod input;
pub(crate) mod kie;
pub mod normalize;
pub mod poll;
pub mod submit;
pub(crate) mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::JobBackend;
pub use batch::{BatchJob, BatchRunner};
pub use client::{request_for, JobClient};
pub use input::{ImageInput, JobInput};
pub use kie::KieBackend;
pub use types::{
    ArtifactKind, JobHandle, JobOutcome, JobRequest, JobStatus, OutcomeStatus, PollOptions,
    ResultPayload, Submission,
};
