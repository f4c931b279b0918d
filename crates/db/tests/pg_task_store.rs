//! Integration tests for the PostgreSQL task store.
//!
//! Each test runs against a fresh database created by `#[sqlx::test]`
//! from `DATABASE_URL`, with the workspace migrations applied.

use std::time::Duration;

use assert_matches::assert_matches;
use roomdesigner_core::types::new_task_id;
use roomdesigner_db::models::generation_task::TaskPatch;
use roomdesigner_db::models::status::GenerationStatus;
use roomdesigner_db::{PgTaskStore, StoreError, TaskStore};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Test: create inserts a pending row with defaults
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_inserts_pending_row(pool: PgPool) {
    let store = PgTaskStore::new(pool);

    let task = store.create("sofa-42").await.unwrap();

    assert_eq!(task.subject_ref, "sofa-42");
    assert_eq!(task.status, GenerationStatus::Pending);
    assert_eq!(task.progress, 0);
    assert_eq!(task.retry_count, 0);
    assert!(task.remote_job_id.is_none());

    let fetched = store.get(task.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, task.id);
    assert_eq!(store.count_active().await.unwrap(), 1);
}

// ---------------------------------------------------------------------------
// Test: update applies only the patched columns and refreshes updated_at
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_applies_patch(pool: PgPool) {
    let store = PgTaskStore::new(pool);
    let task = store.create("sofa-42").await.unwrap();

    let patch = TaskPatch::status(GenerationStatus::Polling)
        .with_remote_job_id(Some("remote-1".to_string()))
        .with_progress(15);
    let updated = store.update(task.id, &patch).await.unwrap().unwrap();

    assert_eq!(updated.status, GenerationStatus::Polling);
    assert_eq!(updated.remote_job_id.as_deref(), Some("remote-1"));
    assert_eq!(updated.progress, 15);
    assert_eq!(updated.retry_count, 0);
    assert!(updated.updated_at >= task.updated_at);

    let cleared = store
        .update(task.id, &TaskPatch::default().with_remote_job_id(None))
        .await
        .unwrap()
        .unwrap();
    assert!(cleared.remote_job_id.is_none());
    assert_eq!(cleared.status, GenerationStatus::Polling);
}

// ---------------------------------------------------------------------------
// Test: missing and terminal rows are never written
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_skips_missing_and_terminal_rows(pool: PgPool) {
    let store = PgTaskStore::new(pool);

    let missing = store
        .update(new_task_id(), &TaskPatch::status(GenerationStatus::Polling))
        .await
        .unwrap();
    assert!(missing.is_none());
    assert!(store.list_all().await.unwrap().is_empty());

    let task = store.create("lamp").await.unwrap();
    store
        .update(task.id, &TaskPatch::status(GenerationStatus::Failed))
        .await
        .unwrap()
        .unwrap();

    let after = store
        .update(task.id, &TaskPatch::status(GenerationStatus::Pending))
        .await
        .unwrap();
    assert!(after.is_none());
    assert_eq!(
        store.get(task.id).await.unwrap().unwrap().status,
        GenerationStatus::Failed
    );
}

// ---------------------------------------------------------------------------
// Test: invalid patches are rejected before any SQL runs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_patch_is_rejected(pool: PgPool) {
    let store = PgTaskStore::new(pool);
    let task = store.create("lamp").await.unwrap();

    let err = store
        .update(task.id, &TaskPatch::default().with_retry_count(-2))
        .await
        .unwrap_err();

    assert_matches!(err, StoreError::Validation(_));
}

// ---------------------------------------------------------------------------
// Test: list_active / purge honour terminal status and age
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn purge_removes_only_aged_terminal_rows(pool: PgPool) {
    let store = PgTaskStore::new(pool.clone());
    let active = store.create("a").await.unwrap();
    let done = store.create("b").await.unwrap();
    store
        .update(done.id, &TaskPatch::status(GenerationStatus::Completed))
        .await
        .unwrap();

    let active_ids: Vec<_> = store
        .list_active()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(active_ids, vec![active.id]);

    assert_eq!(store.purge_older_than(Duration::from_secs(3600)).await.unwrap(), 0);

    // Age the completed row past the grace period.
    sqlx::query("UPDATE generation_tasks SET updated_at = NOW() - INTERVAL '2 hours' WHERE id = $1")
        .bind(done.id)
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(store.purge_older_than(Duration::from_secs(3600)).await.unwrap(), 1);
    assert!(store.get(done.id).await.unwrap().is_none());
    assert!(store.get(active.id).await.unwrap().is_some());
}

// ---------------------------------------------------------------------------
// Test: delete reports whether a row existed
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_reports_existence(pool: PgPool) {
    let store = PgTaskStore::new(pool);
    let task = store.create("desk").await.unwrap();

    assert!(store.delete(task.id).await.unwrap());
    assert!(!store.delete(task.id).await.unwrap());
}

// ---------------------------------------------------------------------------
// Test: delete_active refuses terminal rows
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_active_skips_terminal_rows(pool: PgPool) {
    let store = PgTaskStore::new(pool);
    let active = store.create("desk").await.unwrap();
    let done = store.create("lamp").await.unwrap();
    store
        .update(done.id, &TaskPatch::status(GenerationStatus::Failed))
        .await
        .unwrap()
        .unwrap();

    assert!(!store.delete_active(done.id).await.unwrap());
    assert_eq!(
        store.get(done.id).await.unwrap().unwrap().status,
        GenerationStatus::Failed
    );

    assert!(store.delete_active(active.id).await.unwrap());
    assert!(store.get(active.id).await.unwrap().is_none());
}
