//! Task API and poller lifecycle.

use std::sync::Arc;
use std::time::Duration;

use roomdesigner_core::error::CoreError;
use roomdesigner_core::types::TaskId;
use roomdesigner_db::models::generation_task::{GenerationTask, TaskSummary};
use roomdesigner_db::TaskStore;
use roomdesigner_meshy::RemoteJobClient;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::admission::AdmissionGate;
use crate::config::GenerationConfig;
use crate::error::GenerationError;
use crate::poller::{Poller, TickReport};
use crate::post_process::ResultPostProcessor;

/// Snapshot returned by [`GenerationService::list`].
#[derive(Debug, Clone, Serialize)]
pub struct TaskListing {
    pub tasks: Vec<TaskSummary>,
    pub active_count: i64,
    pub max_capacity: i64,
}

/// Entry point for creating, inspecting and cancelling generation tasks.
///
/// Owns the background [`Poller`]; call [`start`](Self::start) once at
/// startup and [`stop`](Self::stop) during shutdown.
pub struct GenerationService {
    store: Arc<dyn TaskStore>,
    gate: AdmissionGate,
    poller: Arc<Poller>,
    running: Mutex<Option<RunningPoller>>,
}

struct RunningPoller {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl GenerationService {
    pub fn new(
        store: Arc<dyn TaskStore>,
        remote: Arc<dyn RemoteJobClient>,
        post_processor: Arc<dyn ResultPostProcessor>,
        config: &GenerationConfig,
    ) -> Self {
        let poller = Poller::new(Arc::clone(&store), remote, post_processor, config);
        Self {
            store,
            gate: AdmissionGate::new(config.max_concurrent_tasks),
            poller: Arc::new(poller),
            running: Mutex::new(None),
        }
    }

    /// Queue a generation for `subject_ref` and return the new task id.
    ///
    /// The task starts `pending`; the poller submits it on its next
    /// iteration.
    pub async fn create(&self, subject_ref: &str) -> Result<TaskId, GenerationError> {
        let subject_ref = subject_ref.trim();
        if subject_ref.is_empty() {
            return Err(CoreError::Validation("subject_ref must not be blank".to_string()).into());
        }

        let active = self.gate.admit(self.store.as_ref()).await?;
        let task = self.store.create(subject_ref).await?;

        tracing::info!(
            task_id = %task.id,
            subject_ref,
            active = active + 1,
            max = self.gate.max_capacity(),
            "Generation task created",
        );
        Ok(task.id)
    }

    /// Every task, newest first, with the current load.
    pub async fn list(&self) -> Result<TaskListing, GenerationError> {
        let tasks = self.store.list_all().await?;
        let active_count = tasks.iter().filter(|t| !t.is_terminal()).count() as i64;

        Ok(TaskListing {
            tasks: tasks.into_iter().map(TaskSummary::from).collect(),
            active_count,
            max_capacity: self.gate.max_capacity(),
        })
    }

    pub async fn get(&self, id: TaskId) -> Result<GenerationTask, GenerationError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| not_found(id).into())
    }

    /// Delete a task that has not finished yet.
    ///
    /// The remote job, if any, is left to run out on its own. A step in
    /// flight for this task finds the row gone and writes nothing. The
    /// delete itself refuses terminal rows, so a task the poller finishes
    /// after the status check is reported as finished and kept.
    pub async fn cancel(&self, id: TaskId) -> Result<(), GenerationError> {
        let task = self.get(id).await?;
        if task.is_terminal() {
            return Err(already_finished(&task).into());
        }

        if !self.store.delete_active(id).await? {
            return match self.store.get(id).await? {
                Some(current) if current.is_terminal() => Err(already_finished(&current).into()),
                _ => Err(not_found(id).into()),
            };
        }

        tracing::info!(task_id = %id, status = %task.status, "Generation task cancelled");
        Ok(())
    }

    /// Spawn the background poller. Calling it again while running is a
    /// no-op.
    pub async fn start(&self) {
        let mut running = self.running.lock().await;
        if running.is_some() {
            tracing::warn!("Generation poller already running");
            return;
        }

        let cancel = CancellationToken::new();
        let poller = Arc::clone(&self.poller);
        let token = cancel.clone();
        let handle = tokio::spawn(async move { poller.run(token).await });

        *running = Some(RunningPoller { cancel, handle });
    }

    /// Signal the poller to stop and wait up to `timeout` for the current
    /// iteration to finish; after that the task is aborted.
    pub async fn stop(&self, timeout: Duration) {
        let Some(RunningPoller { cancel, mut handle }) = self.running.lock().await.take() else {
            return;
        };

        cancel.cancel();
        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(())) => tracing::info!("Generation poller stopped"),
            Ok(Err(e)) => tracing::error!(error = %e, "Generation poller terminated abnormally"),
            Err(_) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "Generation poller did not stop in time, aborting",
                );
                handle.abort();
            }
        }
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Run one poller iteration inline.
    pub async fn tick(&self) -> TickReport {
        self.poller.tick().await
    }
}

fn not_found(id: TaskId) -> CoreError {
    CoreError::NotFound {
        entity: "GenerationTask",
        id: id.to_string(),
    }
}

fn already_finished(task: &GenerationTask) -> CoreError {
    CoreError::InvalidState(format!("Task {} is already {}", task.id, task.status))
}
