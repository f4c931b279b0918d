//! Background loop driving every active task.
//!
//! Each iteration lists the non-terminal tasks, gives each one processor
//! step, then purges terminal tasks older than the grace period. Runs until
//! its [`CancellationToken`] fires.

use std::sync::Arc;
use std::time::Duration;

use roomdesigner_core::retry::RetryPolicy;
use roomdesigner_db::TaskStore;
use roomdesigner_meshy::RemoteJobClient;
use tokio_util::sync::CancellationToken;

use crate::config::GenerationConfig;
use crate::post_process::ResultPostProcessor;
use crate::processor::TaskProcessor;

/// Counters from a single poller iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tasks whose step wrote a new row state.
    pub advanced: usize,
    /// Tasks whose step hit a store error.
    pub errored: usize,
    /// Terminal tasks removed by the purge.
    pub purged: u64,
}

pub struct Poller {
    store: Arc<dyn TaskStore>,
    processor: TaskProcessor,
    poll_interval: Duration,
    purge_grace: Duration,
}

impl Poller {
    pub fn new(
        store: Arc<dyn TaskStore>,
        remote: Arc<dyn RemoteJobClient>,
        post_processor: Arc<dyn ResultPostProcessor>,
        config: &GenerationConfig,
    ) -> Self {
        let processor = TaskProcessor::new(
            Arc::clone(&store),
            remote,
            post_processor,
            RetryPolicy::new(config.max_retries),
            config.step_timeout,
        );
        Self {
            store,
            processor,
            poll_interval: config.poll_interval,
            purge_grace: config.purge_grace,
        }
    }

    /// Run iterations until `cancel` fires, sleeping `poll_interval`
    /// between them. An iteration in progress is allowed to finish.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            purge_grace_secs = self.purge_grace.as_secs(),
            "Generation poller started",
        );

        loop {
            let report = self.tick().await;
            if report != TickReport::default() {
                tracing::debug!(
                    advanced = report.advanced,
                    errored = report.errored,
                    purged = report.purged,
                    "Generation poller iteration finished",
                );
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Generation poller shutting down");
                    break;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    /// One iteration: step every active task, then purge aged terminal tasks.
    ///
    /// Store failures are logged and never escape; a failure to list ends
    /// the iteration early.
    pub async fn tick(&self) -> TickReport {
        let mut report = TickReport::default();

        let tasks = match self.store.list_active().await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list active generation tasks");
                return report;
            }
        };

        for task in &tasks {
            match self.processor.step(task).await {
                Ok(Some(updated)) => {
                    report.advanced += 1;
                    if updated.status != task.status {
                        tracing::debug!(
                            task_id = %task.id,
                            from = %task.status,
                            to = %updated.status,
                            progress = updated.progress,
                            "Generation task advanced",
                        );
                    }
                }
                Ok(None) => {
                    tracing::debug!(task_id = %task.id, "Generation task gone before its step finished");
                }
                Err(e) => {
                    report.errored += 1;
                    tracing::error!(task_id = %task.id, error = %e, "Generation step failed to persist");
                }
            }
        }

        match self.store.purge_older_than(self.purge_grace).await {
            Ok(purged) => {
                report.purged = purged;
                if purged > 0 {
                    tracing::info!(purged, "Purged finished generation tasks");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to purge finished generation tasks");
            }
        }

        report
    }
}
