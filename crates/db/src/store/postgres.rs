use std::time::Duration;

use async_trait::async_trait;
use roomdesigner_core::types::TaskId;
use validator::Validate;

use super::{purge_cutoff, StoreResult, TaskStore};
use crate::models::generation_task::{GenerationTask, TaskPatch};
use crate::repositories::GenerationTaskRepo;
use crate::DbPool;

/// PostgreSQL-backed [`TaskStore`] delegating to [`GenerationTaskRepo`].
#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: DbPool,
}

impl PgTaskStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn create(&self, subject_ref: &str) -> StoreResult<GenerationTask> {
        Ok(GenerationTaskRepo::create(&self.pool, subject_ref).await?)
    }

    async fn get(&self, id: TaskId) -> StoreResult<Option<GenerationTask>> {
        Ok(GenerationTaskRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_active(&self) -> StoreResult<Vec<GenerationTask>> {
        Ok(GenerationTaskRepo::list_active(&self.pool).await?)
    }

    async fn list_all(&self) -> StoreResult<Vec<GenerationTask>> {
        Ok(GenerationTaskRepo::list_all(&self.pool).await?)
    }

    async fn count_active(&self) -> StoreResult<i64> {
        Ok(GenerationTaskRepo::count_active(&self.pool).await?)
    }

    async fn update(&self, id: TaskId, patch: &TaskPatch) -> StoreResult<Option<GenerationTask>> {
        patch.validate()?;
        let updated = GenerationTaskRepo::update(&self.pool, id, patch).await?;
        if updated.is_none() {
            tracing::debug!(task_id = %id, "Update skipped: task missing or terminal");
        }
        Ok(updated)
    }

    async fn delete(&self, id: TaskId) -> StoreResult<bool> {
        Ok(GenerationTaskRepo::delete(&self.pool, id).await?)
    }

    async fn delete_active(&self, id: TaskId) -> StoreResult<bool> {
        Ok(GenerationTaskRepo::delete_active(&self.pool, id).await?)
    }

    async fn purge_older_than(&self, age: Duration) -> StoreResult<u64> {
        match purge_cutoff(age) {
            Some(cutoff) => {
                Ok(GenerationTaskRepo::delete_terminal_older_than(&self.pool, cutoff).await?)
            }
            None => Ok(0),
        }
    }
}
