//! Per-task state machine.
//!
//! [`TaskProcessor::step`] advances a single task by at most one stage and
//! persists the result. Every failure of the remote client or the
//! post-processor is recorded on the task row; only store failures are
//! returned to the caller.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use roomdesigner_core::error::JobError;
use roomdesigner_core::retry::{merge_progress, RetryDecision, RetryPolicy};
use roomdesigner_db::models::generation_task::{GenerationTask, TaskPatch};
use roomdesigner_db::models::status::GenerationStatus;
use roomdesigner_db::{StoreResult, TaskStore};
use roomdesigner_meshy::{RemoteJobClient, RemoteJobState};

use crate::post_process::ResultPostProcessor;

pub(crate) struct TaskProcessor {
    store: Arc<dyn TaskStore>,
    remote: Arc<dyn RemoteJobClient>,
    post_processor: Arc<dyn ResultPostProcessor>,
    retry: RetryPolicy,
    step_timeout: Duration,
}

impl TaskProcessor {
    pub(crate) fn new(
        store: Arc<dyn TaskStore>,
        remote: Arc<dyn RemoteJobClient>,
        post_processor: Arc<dyn ResultPostProcessor>,
        retry: RetryPolicy,
        step_timeout: Duration,
    ) -> Self {
        Self {
            store,
            remote,
            post_processor,
            retry,
            step_timeout,
        }
    }

    /// Advance `task` by one stage.
    ///
    /// Returns the row as written, or `None` when nothing was written
    /// because the task is terminal or disappeared (cancelled) mid-step.
    pub(crate) async fn step(&self, task: &GenerationTask) -> StoreResult<Option<GenerationTask>> {
        match task.status {
            GenerationStatus::Pending => self.submit(task).await,
            GenerationStatus::Creating => self.reset_interrupted_submit(task).await,
            GenerationStatus::Polling => self.poll(task).await,
            GenerationStatus::Downloading => self.download(task).await,
            GenerationStatus::Completed | GenerationStatus::Failed => Ok(None),
        }
    }

    async fn submit(&self, task: &GenerationTask) -> StoreResult<Option<GenerationTask>> {
        let creating = TaskPatch::status(GenerationStatus::Creating);
        if self.store.update(task.id, &creating).await?.is_none() {
            return Ok(None);
        }

        match self
            .guarded("submit", self.remote.submit(&task.subject_ref))
            .await
        {
            Ok(remote_job_id) => {
                tracing::info!(task_id = %task.id, %remote_job_id, "Remote job submitted");
                let patch = TaskPatch::status(GenerationStatus::Polling)
                    .with_remote_job_id(Some(remote_job_id))
                    .with_error_message(None);
                self.store.update(task.id, &patch).await
            }
            Err(err) => self.record_failure(task, err).await,
        }
    }

    /// A `creating` row at the start of an iteration means the process
    /// stopped between persisting `creating` and recording the job id. The
    /// submission may or may not have reached the remote service; it is
    /// resubmitted without spending retry budget.
    async fn reset_interrupted_submit(
        &self,
        task: &GenerationTask,
    ) -> StoreResult<Option<GenerationTask>> {
        tracing::warn!(
            task_id = %task.id,
            "Task found mid-submission, resetting to pending",
        );
        let patch = TaskPatch::status(GenerationStatus::Pending).with_remote_job_id(None);
        self.store.update(task.id, &patch).await
    }

    async fn poll(&self, task: &GenerationTask) -> StoreResult<Option<GenerationTask>> {
        let Some(remote_job_id) = task.remote_job_id.as_deref() else {
            return self
                .record_failure(task, JobError::retryable("Polling task has no remote job id"))
                .await;
        };

        let status = match self.guarded("poll", self.remote.poll(remote_job_id)).await {
            Ok(status) => status,
            Err(err) => return self.record_failure(task, err).await,
        };
        let progress = merge_progress(task.progress, status.progress);

        match status.state {
            RemoteJobState::Queued | RemoteJobState::Running => {
                let patch = TaskPatch::status(GenerationStatus::Polling).with_progress(progress);
                self.store.update(task.id, &patch).await
            }
            RemoteJobState::Succeeded => match status.result_ref {
                Some(result_ref) => {
                    tracing::info!(task_id = %task.id, %remote_job_id, "Remote job succeeded");
                    let patch = TaskPatch::status(GenerationStatus::Downloading)
                        .with_progress(progress)
                        .with_result_ref(Some(result_ref));
                    self.store.update(task.id, &patch).await
                }
                None => {
                    let err = JobError::permanent("Remote job succeeded without a result");
                    self.record_failure(task, err).await
                }
            },
            RemoteJobState::Failed => {
                let message = status
                    .message
                    .unwrap_or_else(|| "Remote job failed".to_string());
                self.record_failure(task, JobError::permanent(message)).await
            }
        }
    }

    async fn download(&self, task: &GenerationTask) -> StoreResult<Option<GenerationTask>> {
        let Some(result_ref) = task.result_ref.as_deref() else {
            return self
                .record_failure(task, JobError::retryable("Downloading task has no result reference"))
                .await;
        };

        let outcome = match self
            .guarded("download", self.remote.fetch_result(result_ref))
            .await
        {
            Ok(payload) => {
                self.guarded(
                    "post-process",
                    self.post_processor.process(&task.subject_ref, payload),
                )
                .await
            }
            Err(err) => Err(err),
        };

        match outcome {
            Ok(()) => {
                tracing::info!(task_id = %task.id, subject_ref = %task.subject_ref, "Generation completed");
                let patch = TaskPatch::status(GenerationStatus::Completed)
                    .with_progress(100)
                    .with_error_message(None);
                self.store.update(task.id, &patch).await
            }
            Err(err) => self.record_failure(task, err).await,
        }
    }

    /// Apply the retry policy to a failed step and persist the outcome.
    async fn record_failure(
        &self,
        task: &GenerationTask,
        err: JobError,
    ) -> StoreResult<Option<GenerationTask>> {
        let patch = match err {
            JobError::Permanent(message) => {
                tracing::error!(task_id = %task.id, error = %message, "Generation failed permanently");
                TaskPatch::status(GenerationStatus::Failed).with_error_message(Some(message))
            }
            JobError::Retryable(message) => match self.retry.on_retryable_failure(task.retry_count) {
                RetryDecision::Retry { retry_count } => {
                    tracing::warn!(
                        task_id = %task.id,
                        retry_count,
                        max_retries = self.retry.max_retries,
                        error = %message,
                        "Generation step failed, retrying",
                    );
                    TaskPatch::status(GenerationStatus::Pending)
                        .with_retry_count(retry_count)
                        .with_remote_job_id(None)
                        .with_result_ref(None)
                        .with_error_message(Some(message))
                }
                RetryDecision::GiveUp => {
                    tracing::error!(
                        task_id = %task.id,
                        retry_count = task.retry_count,
                        error = %message,
                        "Generation failed, retries exhausted",
                    );
                    TaskPatch::status(GenerationStatus::Failed).with_error_message(Some(message))
                }
            },
        };

        self.store.update(task.id, &patch).await
    }

    /// Run one remote or post-processing call under the step timeout,
    /// turning an elapsed timeout or a panic into a retryable failure.
    async fn guarded<T, F>(&self, operation: &'static str, call: F) -> Result<T, JobError>
    where
        F: Future<Output = Result<T, JobError>>,
    {
        match tokio::time::timeout(self.step_timeout, AssertUnwindSafe(call).catch_unwind()).await
        {
            Ok(Ok(result)) => result,
            Ok(Err(_panic)) => Err(JobError::retryable(format!(
                "Unclassified failure during {operation}"
            ))),
            Err(_elapsed) => Err(JobError::retryable(format!(
                "{operation} timed out after {:?}",
                self.step_timeout
            ))),
        }
    }
}
