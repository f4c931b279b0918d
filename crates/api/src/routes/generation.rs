//! Route definitions for the `/generation` resource.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::generation;
use crate::state::AppState;

/// Routes mounted at `/generation`.
///
/// ```text
/// GET    /tasks                -> list_tasks
/// POST   /tasks                -> create_task
/// DELETE /tasks/{task_id}      -> cancel_task
/// GET    /status/{task_id}     -> get_task_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/tasks",
            get(generation::list_tasks).post(generation::create_task),
        )
        .route("/tasks/{task_id}", delete(generation::cancel_task))
        .route("/status/{task_id}", get(generation::get_task_status))
}
