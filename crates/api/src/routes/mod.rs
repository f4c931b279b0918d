pub mod generation;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /generation/tasks                   list, create
/// /generation/tasks/{task_id}         cancel (DELETE)
/// /generation/status/{task_id}        task detail
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/generation", generation::router())
}
