//! Status enum mapping to the `generation_task_statuses` lookup table.
//!
//! Each variant's discriminant matches the seed data order (1-based) in
//! the migration, and the enum decodes directly from the SMALLINT column.

use serde::{Deserialize, Serialize};

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

/// Generation task stage.
///
/// `Pending -> Creating -> Polling -> Downloading -> Completed`, with any
/// non-terminal stage able to fall back to `Pending` (retry) or move to
/// `Failed`.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Pending = 1,
    Creating = 2,
    Polling = 3,
    Downloading = 4,
    Completed = 5,
    Failed = 6,
}

/// Statuses the poller still has work to do for.
pub const ACTIVE_STATUSES: [GenerationStatus; 4] = [
    GenerationStatus::Pending,
    GenerationStatus::Creating,
    GenerationStatus::Polling,
    GenerationStatus::Downloading,
];

/// Statuses that never change again (only deletion/purge).
pub const TERMINAL_STATUSES: [GenerationStatus; 2] =
    [GenerationStatus::Completed, GenerationStatus::Failed];

impl GenerationStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Creating => "creating",
            Self::Polling => "polling",
            Self::Downloading => "downloading",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl From<GenerationStatus> for StatusId {
    fn from(value: GenerationStatus) -> Self {
        value as StatusId
    }
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
