/// Domain errors surfaced by the generation Task API.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// The entity exists but is in a state that forbids the operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Admission control rejected new work.
    #[error("Capacity exceeded: {active} active tasks, maximum is {max}")]
    CapacityExceeded { active: i64, max: i64 },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Outcome classification for a failed pipeline step.
///
/// Returned by remote job clients and result post-processors. The task
/// processor only ever branches on these two variants; protocol detail
/// stays inside the component that produced the error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    /// Transient failure (timeout, network, 5xx, rate limit, anything
    /// unclassified). Consumes one unit of retry budget.
    #[error("retryable: {0}")]
    Retryable(String),

    /// Non-retryable failure (bad configuration, rejected input, remote
    /// job failure). Ends the task immediately.
    #[error("permanent: {0}")]
    Permanent(String),
}

impl JobError {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self::Retryable(message.into())
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Permanent(message.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }

    /// The human-readable message without the classification prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Retryable(msg) | Self::Permanent(msg) => msg,
        }
    }
}
