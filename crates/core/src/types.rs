/// Generation task primary keys are UUID v7 (time-ordered).
pub type TaskId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Allocate a fresh, time-ordered task identifier.
pub fn new_task_id() -> TaskId {
    uuid::Uuid::now_v7()
}
