//! Generation task entity model and the typed update patch.

use roomdesigner_core::types::{TaskId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;
use validator::Validate;

use super::status::GenerationStatus;

/// A row from the `generation_tasks` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct GenerationTask {
    pub id: TaskId,
    /// Furniture item the generated model belongs to.
    pub subject_ref: String,
    /// Job identifier assigned by the remote service once submission succeeds.
    pub remote_job_id: Option<String>,
    #[sqlx(rename = "status_id")]
    pub status: GenerationStatus,
    pub progress: i16,
    pub retry_count: i32,
    pub error_message: Option<String>,
    /// Downloadable result location reported by the remote service.
    pub result_ref: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl GenerationTask {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Compact listing entry for `GET /generation/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub id: TaskId,
    pub subject_ref: String,
    pub status: GenerationStatus,
    pub progress: i16,
    pub error_message: Option<String>,
}

impl From<GenerationTask> for TaskSummary {
    fn from(task: GenerationTask) -> Self {
        Self {
            id: task.id,
            subject_ref: task.subject_ref,
            status: task.status,
            progress: task.progress,
            error_message: task.error_message,
        }
    }
}

/// Partial update of a generation task.
///
/// Only the columns listed here can be changed after creation; `id`,
/// `subject_ref` and `created_at` are immutable and `updated_at` is always
/// refreshed by the store. Nullable columns use `Option<Option<_>>`: the
/// outer `None` leaves the column alone, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct TaskPatch {
    pub status: Option<GenerationStatus>,
    pub remote_job_id: Option<Option<String>>,
    #[validate(range(min = 0, max = 100))]
    pub progress: Option<i16>,
    #[validate(range(min = 0))]
    pub retry_count: Option<i32>,
    pub error_message: Option<Option<String>>,
    pub result_ref: Option<Option<String>>,
}

impl TaskPatch {
    pub fn status(status: GenerationStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_remote_job_id(mut self, remote_job_id: Option<String>) -> Self {
        self.remote_job_id = Some(remote_job_id);
        self
    }

    pub fn with_progress(mut self, progress: i16) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_retry_count(mut self, retry_count: i32) -> Self {
        self.retry_count = Some(retry_count);
        self
    }

    pub fn with_error_message(mut self, message: Option<String>) -> Self {
        self.error_message = Some(message);
        self
    }

    pub fn with_result_ref(mut self, result_ref: Option<String>) -> Self {
        self.result_ref = Some(result_ref);
        self
    }

    /// True when the patch would only refresh `updated_at`.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the patch to an in-memory row. Does not touch `updated_at`.
    pub fn apply_to(&self, task: &mut GenerationTask) {
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(remote_job_id) = &self.remote_job_id {
            task.remote_job_id = remote_job_id.clone();
        }
        if let Some(progress) = self.progress {
            task.progress = progress;
        }
        if let Some(retry_count) = self.retry_count {
            task.retry_count = retry_count;
        }
        if let Some(error_message) = &self.error_message {
            task.error_message = error_message.clone();
        }
        if let Some(result_ref) = &self.result_ref {
            task.result_ref = result_ref.clone();
        }
    }
}
