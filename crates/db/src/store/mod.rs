//! Task store abstraction.
//!
//! [`TaskStore`] is the single source of truth for generation task state.
//! The pipeline reads and writes exclusively through this trait so the same
//! orchestration code runs against PostgreSQL in production and against
//! [`MemoryTaskStore`] in tests.

mod memory;
mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use roomdesigner_core::types::{TaskId, Timestamp};

use crate::models::generation_task::{GenerationTask, TaskPatch};

pub use memory::MemoryTaskStore;
pub use postgres::PgTaskStore;

/// Result type for task store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by task store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing database failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A patch was rejected before reaching storage.
    #[error("Invalid task patch: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Persistence contract for generation tasks.
///
/// Implementations must make every single-row operation atomic and allow
/// reads concurrently with the poller's writes.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new `pending` task.
    async fn create(&self, subject_ref: &str) -> StoreResult<GenerationTask>;

    /// Look up a task by ID.
    async fn get(&self, id: TaskId) -> StoreResult<Option<GenerationTask>>;

    /// Non-terminal tasks, oldest first.
    async fn list_active(&self) -> StoreResult<Vec<GenerationTask>>;

    /// Every task, newest first.
    async fn list_all(&self) -> StoreResult<Vec<GenerationTask>>;

    /// Number of non-terminal tasks.
    async fn count_active(&self) -> StoreResult<i64>;

    /// Apply `patch` and refresh `updated_at`.
    ///
    /// Returns the updated row, or `None` when the task does not exist or
    /// is terminal. Never creates a row.
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`] if the patch fails validation; nothing is
    /// written in that case.
    async fn update(&self, id: TaskId, patch: &TaskPatch) -> StoreResult<Option<GenerationTask>>;

    /// Remove a task. Returns `true` if it existed.
    async fn delete(&self, id: TaskId) -> StoreResult<bool>;

    /// Remove a task only if it is not terminal, as a single atomic step.
    /// Returns `false` when the task is missing or already terminal.
    async fn delete_active(&self, id: TaskId) -> StoreResult<bool>;

    /// Remove terminal tasks whose `updated_at` is older than `age`.
    /// Returns the number of rows removed.
    async fn purge_older_than(&self, age: Duration) -> StoreResult<u64>;
}

/// Oldest `updated_at` a terminal task may have and still survive a purge.
///
/// `None` when `age` reaches back further than the representable time
/// range, meaning nothing can be old enough to purge.
pub(crate) fn purge_cutoff(age: Duration) -> Option<Timestamp> {
    let age = chrono::Duration::from_std(age).ok()?;
    Utc::now().checked_sub_signed(age)
}
