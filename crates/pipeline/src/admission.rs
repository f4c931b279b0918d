//! Capacity check applied before a task is created.

use roomdesigner_core::error::CoreError;
use roomdesigner_db::TaskStore;

use crate::error::GenerationError;

/// Rejects new tasks once the number of non-terminal tasks reaches the cap.
///
/// The check reads the count and the caller writes afterwards, so
/// concurrent creations can overshoot the cap by the number of racing
/// requests.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionGate {
    max_concurrent_tasks: i64,
}

impl AdmissionGate {
    pub fn new(max_concurrent_tasks: i64) -> Self {
        Self {
            max_concurrent_tasks,
        }
    }

    pub fn max_capacity(&self) -> i64 {
        self.max_concurrent_tasks
    }

    /// Returns the current active count when there is room for one more.
    pub async fn admit(&self, store: &dyn TaskStore) -> Result<i64, GenerationError> {
        let active = store.count_active().await?;
        if active >= self.max_concurrent_tasks {
            tracing::warn!(
                active,
                max = self.max_concurrent_tasks,
                "Generation capacity exceeded",
            );
            return Err(CoreError::CapacityExceeded {
                active,
                max: self.max_concurrent_tasks,
            }
            .into());
        }
        Ok(active)
    }
}
