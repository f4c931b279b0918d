//! In-memory [`TaskStore`] used by tests and database-less deployments.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use roomdesigner_core::types::{new_task_id, TaskId};
use tokio::sync::RwLock;
use validator::Validate;

use super::{purge_cutoff, StoreResult, TaskStore};
use crate::models::generation_task::{GenerationTask, TaskPatch};
use crate::models::status::GenerationStatus;

/// Thread-safe in-memory task store.
///
/// Clones share the same underlying map. State does not survive a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryTaskStore {
    state: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    /// Insertion counter giving a stable creation order independent of
    /// timestamp resolution.
    next_seq: u64,
    tasks: HashMap<TaskId, Entry>,
}

#[derive(Debug)]
struct Entry {
    seq: u64,
    task: GenerationTask,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of rows, terminal ones included.
    pub async fn len(&self) -> usize {
        self.state.read().await.tasks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of matching rows ordered by creation.
    async fn collect(&self, filter: impl Fn(&GenerationTask) -> bool) -> Vec<GenerationTask> {
        let state = self.state.read().await;
        let mut entries: Vec<&Entry> = state
            .tasks
            .values()
            .filter(|entry| filter(&entry.task))
            .collect();
        entries.sort_by_key(|entry| entry.seq);
        entries.into_iter().map(|entry| entry.task.clone()).collect()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn create(&self, subject_ref: &str) -> StoreResult<GenerationTask> {
        let now = Utc::now();
        let task = GenerationTask {
            id: new_task_id(),
            subject_ref: subject_ref.to_string(),
            remote_job_id: None,
            status: GenerationStatus::Pending,
            progress: 0,
            retry_count: 0,
            error_message: None,
            result_ref: None,
            created_at: now,
            updated_at: now,
        };

        let mut state = self.state.write().await;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.tasks.insert(
            task.id,
            Entry {
                seq,
                task: task.clone(),
            },
        );
        Ok(task)
    }

    async fn get(&self, id: TaskId) -> StoreResult<Option<GenerationTask>> {
        let state = self.state.read().await;
        Ok(state.tasks.get(&id).map(|entry| entry.task.clone()))
    }

    async fn list_active(&self) -> StoreResult<Vec<GenerationTask>> {
        Ok(self.collect(|task| !task.is_terminal()).await)
    }

    async fn list_all(&self) -> StoreResult<Vec<GenerationTask>> {
        let mut tasks = self.collect(|_| true).await;
        tasks.reverse();
        Ok(tasks)
    }

    async fn count_active(&self) -> StoreResult<i64> {
        let state = self.state.read().await;
        let active = state
            .tasks
            .values()
            .filter(|entry| !entry.task.is_terminal())
            .count();
        Ok(active as i64)
    }

    async fn update(&self, id: TaskId, patch: &TaskPatch) -> StoreResult<Option<GenerationTask>> {
        patch.validate()?;

        let mut state = self.state.write().await;
        let Some(entry) = state.tasks.get_mut(&id) else {
            tracing::debug!(task_id = %id, "Update skipped: task missing");
            return Ok(None);
        };
        if entry.task.is_terminal() {
            tracing::debug!(task_id = %id, "Update skipped: task is terminal");
            return Ok(None);
        }

        patch.apply_to(&mut entry.task);
        entry.task.updated_at = Utc::now();
        Ok(Some(entry.task.clone()))
    }

    async fn delete(&self, id: TaskId) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        Ok(state.tasks.remove(&id).is_some())
    }

    async fn delete_active(&self, id: TaskId) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        match state.tasks.get(&id) {
            Some(entry) if !entry.task.is_terminal() => {
                state.tasks.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn purge_older_than(&self, age: Duration) -> StoreResult<u64> {
        let Some(cutoff) = purge_cutoff(age) else {
            return Ok(0);
        };

        let mut state = self.state.write().await;
        let before = state.tasks.len();
        state
            .tasks
            .retain(|_, entry| !(entry.task.is_terminal() && entry.task.updated_at < cutoff));
        Ok((before - state.tasks.len()) as u64)
    }
}
