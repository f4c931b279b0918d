//! Handlers for the `/generation` resource.
//!
//! Creation only queues a task; the background poller does the remote work,
//! so every handler returns without waiting on Meshy.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use roomdesigner_core::error::CoreError;
use roomdesigner_core::types::TaskId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /generation/tasks`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGenerationTask {
    /// Furniture item to generate a 3D model for.
    #[validate(length(min = 1, max = 255))]
    pub subject_ref: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedTask {
    pub task_id: TaskId,
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/v1/generation/tasks
///
/// Queue a generation. Returns 201 with the task id, or 429 when the
/// number of active tasks has reached the configured capacity.
pub async fn create_task(
    State(state): State<AppState>,
    Json(input): Json<CreateGenerationTask>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    let task_id = state.generation.create(&input.subject_ref).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedTask { task_id },
        }),
    ))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/v1/generation/tasks
pub async fn list_tasks(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let listing = state.generation.list().await?;
    Ok(Json(DataResponse { data: listing }))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// GET /api/v1/generation/status/{task_id}
pub async fn get_task_status(
    State(state): State<AppState>,
    Path(task_id): Path<TaskId>,
) -> AppResult<impl IntoResponse> {
    let task = state.generation.get(task_id).await?;
    Ok(Json(DataResponse { data: task }))
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

/// DELETE /api/v1/generation/tasks/{task_id}
///
/// Remove a task that has not finished. Returns 204, 400 if it already
/// completed or failed, 404 if it does not exist.
pub async fn cancel_task(
    State(state): State<AppState>,
    Path(task_id): Path<TaskId>,
) -> AppResult<StatusCode> {
    state.generation.cancel(task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
