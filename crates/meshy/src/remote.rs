//! The remote job seam driven by the generation pipeline.

use async_trait::async_trait;
use roomdesigner_core::error::JobError;

/// Coarse state of a job on the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteJobState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

/// Snapshot returned by [`RemoteJobClient::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteJobStatus {
    pub state: RemoteJobState,
    /// Remote-reported progress. Not guaranteed to be within `0..=100`.
    pub progress: i64,
    /// Downloadable result location, present once the job succeeded.
    pub result_ref: Option<String>,
    /// Failure reason reported by the remote service.
    pub message: Option<String>,
}

impl RemoteJobStatus {
    pub fn new(state: RemoteJobState, progress: i64) -> Self {
        Self {
            state,
            progress,
            result_ref: None,
            message: None,
        }
    }

    pub fn with_result_ref(mut self, result_ref: impl Into<String>) -> Self {
        self.result_ref = Some(result_ref.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Submits work to a remote generation service and tracks it.
///
/// Implementations classify every failure into [`JobError`]; they never
/// panic on remote misbehaviour and carry no per-task state.
#[async_trait]
pub trait RemoteJobClient: Send + Sync {
    /// Start a remote job for `subject_ref` and return its job id.
    async fn submit(&self, subject_ref: &str) -> Result<String, JobError>;

    /// Current state of a previously submitted job.
    async fn poll(&self, remote_job_id: &str) -> Result<RemoteJobStatus, JobError>;

    /// Download the artifact a succeeded job points at.
    async fn fetch_result(&self, result_ref: &str) -> Result<Vec<u8>, JobError>;
}
