//! Bounded retry policy for generation tasks.
//!
//! A retryable failure sends the task back to `pending` while budget
//! remains; once `retry_count` has reached `max_retries` the next
//! retryable failure is terminal. `retry_count` therefore never exceeds
//! `max_retries`.

/// What to do with a task after a retryable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Reset to `pending` with the incremented retry count.
    Retry { retry_count: i32 },
    /// Budget exhausted: mark the task failed, retry count unchanged.
    GiveUp,
}

/// Retry budget for a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: i32,
}

impl RetryPolicy {
    pub fn new(max_retries: i32) -> Self {
        Self {
            max_retries: max_retries.max(0),
        }
    }

    /// Decide the follow-up for a task that has already been retried
    /// `retry_count` times and just failed again.
    pub fn on_retryable_failure(&self, retry_count: i32) -> RetryDecision {
        if retry_count < self.max_retries {
            RetryDecision::Retry {
                retry_count: retry_count + 1,
            }
        } else {
            RetryDecision::GiveUp
        }
    }
}

/// Merge a freshly reported progress value into the stored one.
///
/// Progress is clamped to 0..=100 and never moves backwards while a task
/// is active.
pub fn merge_progress(current: i16, reported: i64) -> i16 {
    let reported = reported.clamp(0, 100) as i16;
    current.max(reported)
}
