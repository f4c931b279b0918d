//! Repository for the `generation_tasks` table.
//!
//! Every operation is a single statement, so each row mutation is atomic
//! without explicit transactions. Updates never touch terminal rows.

use roomdesigner_core::types::{new_task_id, TaskId, Timestamp};
use sqlx::PgPool;

use crate::models::generation_task::{GenerationTask, TaskPatch};
use crate::models::status::{GenerationStatus, ACTIVE_STATUSES, TERMINAL_STATUSES};

/// Column list for `generation_tasks` queries.
const COLUMNS: &str = "\
    id, subject_ref, remote_job_id, status_id, progress, retry_count, \
    error_message, result_ref, created_at, updated_at";

/// Provides CRUD operations for generation tasks.
pub struct GenerationTaskRepo;

impl GenerationTaskRepo {
    /// Insert a new `pending` task for the given subject.
    pub async fn create(pool: &PgPool, subject_ref: &str) -> Result<GenerationTask, sqlx::Error> {
        let query = format!(
            "INSERT INTO generation_tasks (id, subject_ref, status_id) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GenerationTask>(&query)
            .bind(new_task_id())
            .bind(subject_ref)
            .bind(GenerationStatus::Pending.id())
            .fetch_one(pool)
            .await
    }

    /// Find a task by its ID.
    pub async fn find_by_id(pool: &PgPool, id: TaskId) -> Result<Option<GenerationTask>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM generation_tasks WHERE id = $1");
        sqlx::query_as::<_, GenerationTask>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All non-terminal tasks, oldest first.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<GenerationTask>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM generation_tasks \
             WHERE status_id IN ($1, $2, $3, $4) \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, GenerationTask>(&query)
            .bind(ACTIVE_STATUSES[0].id())
            .bind(ACTIVE_STATUSES[1].id())
            .bind(ACTIVE_STATUSES[2].id())
            .bind(ACTIVE_STATUSES[3].id())
            .fetch_all(pool)
            .await
    }

    /// All tasks, newest first.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<GenerationTask>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM generation_tasks ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, GenerationTask>(&query)
            .fetch_all(pool)
            .await
    }

    /// Number of non-terminal tasks.
    pub async fn count_active(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM generation_tasks WHERE status_id NOT IN ($1, $2)",
        )
        .bind(TERMINAL_STATUSES[0].id())
        .bind(TERMINAL_STATUSES[1].id())
        .fetch_one(pool)
        .await
    }

    /// Apply a validated patch to a non-terminal task.
    ///
    /// Always refreshes `updated_at`. Returns `None` if the row does not
    /// exist or is already terminal; nothing is written in that case.
    pub async fn update(
        pool: &PgPool,
        id: TaskId,
        patch: &TaskPatch,
    ) -> Result<Option<GenerationTask>, sqlx::Error> {
        // Build the SET clause and track the next bind parameter index.
        let mut assignments: Vec<String> = vec!["updated_at = NOW()".to_string()];
        let mut bind_idx: u32 = 2;

        if patch.status.is_some() {
            assignments.push(format!("status_id = ${bind_idx}"));
            bind_idx += 1;
        }
        if patch.remote_job_id.is_some() {
            assignments.push(format!("remote_job_id = ${bind_idx}"));
            bind_idx += 1;
        }
        if patch.progress.is_some() {
            assignments.push(format!("progress = ${bind_idx}"));
            bind_idx += 1;
        }
        if patch.retry_count.is_some() {
            assignments.push(format!("retry_count = ${bind_idx}"));
            bind_idx += 1;
        }
        if patch.error_message.is_some() {
            assignments.push(format!("error_message = ${bind_idx}"));
            bind_idx += 1;
        }
        if patch.result_ref.is_some() {
            assignments.push(format!("result_ref = ${bind_idx}"));
            bind_idx += 1;
        }

        let query = format!(
            "UPDATE generation_tasks SET {} \
             WHERE id = $1 AND status_id NOT IN (${bind_idx}, ${}) \
             RETURNING {COLUMNS}",
            assignments.join(", "),
            bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, GenerationTask>(&query).bind(id);

        if let Some(status) = patch.status {
            q = q.bind(status.id());
        }
        if let Some(remote_job_id) = &patch.remote_job_id {
            q = q.bind(remote_job_id.as_deref());
        }
        if let Some(progress) = patch.progress {
            q = q.bind(progress);
        }
        if let Some(retry_count) = patch.retry_count {
            q = q.bind(retry_count);
        }
        if let Some(error_message) = &patch.error_message {
            q = q.bind(error_message.as_deref());
        }
        if let Some(result_ref) = &patch.result_ref {
            q = q.bind(result_ref.as_deref());
        }

        q = q
            .bind(TERMINAL_STATUSES[0].id())
            .bind(TERMINAL_STATUSES[1].id());

        q.fetch_optional(pool).await
    }

    /// Delete a task regardless of status. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: TaskId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM generation_tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a task only while it is still active. Returns `true` if a
    /// row was removed; a missing or terminal row is left untouched.
    pub async fn delete_active(pool: &PgPool, id: TaskId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM generation_tasks WHERE id = $1 AND status_id NOT IN ($2, $3)",
        )
        .bind(id)
        .bind(TERMINAL_STATUSES[0].id())
        .bind(TERMINAL_STATUSES[1].id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete terminal tasks last updated before `cutoff`.
    pub async fn delete_terminal_older_than(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM generation_tasks \
             WHERE status_id IN ($1, $2) AND updated_at < $3",
        )
        .bind(TERMINAL_STATUSES[0].id())
        .bind(TERMINAL_STATUSES[1].id())
        .bind(cutoff)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
