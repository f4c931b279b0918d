//! Scripted collaborators for driving the generation pipeline.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use roomdesigner_core::error::JobError;
use roomdesigner_core::types::TaskId;
use roomdesigner_db::models::generation_task::{GenerationTask, TaskPatch};
use roomdesigner_db::models::status::GenerationStatus;
use roomdesigner_db::{MemoryTaskStore, StoreResult, TaskStore};
use roomdesigner_meshy::{RemoteJobClient, RemoteJobState, RemoteJobStatus};
use roomdesigner_pipeline::{GenerationConfig, GenerationService, ModelFileWriter};

/// One scripted response from a fake collaborator.
pub enum Step<T> {
    Return(Result<T, JobError>),
    /// Never resolves; only the step timeout ends the call.
    Hang,
    Panic,
}

impl<T> Step<T> {
    pub fn ok(value: T) -> Self {
        Self::Return(Ok(value))
    }

    pub fn retryable(message: &str) -> Self {
        Self::Return(Err(JobError::retryable(message)))
    }

    pub fn permanent(message: &str) -> Self {
        Self::Return(Err(JobError::permanent(message)))
    }

    async fn play(self) -> Result<T, JobError> {
        match self {
            Self::Return(result) => result,
            Self::Hang => std::future::pending().await,
            Self::Panic => panic!("scripted panic"),
        }
    }
}

/// Queue of scripted responses plus a call counter.
pub struct Script<T> {
    steps: Mutex<VecDeque<Step<T>>>,
    calls: AtomicUsize,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl<T> Script<T> {
    pub fn push(&self, step: Step<T>) {
        self.steps.lock().unwrap().push_back(step);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn next(&self, what: &str) -> Result<T, JobError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(step) => step.play().await,
            None => Err(JobError::retryable(format!("no scripted {what} response"))),
        }
    }
}

/// Remote job client answering from per-operation scripts.
#[derive(Default)]
pub struct ScriptedRemote {
    pub submits: Script<String>,
    pub polls: Script<RemoteJobStatus>,
    pub fetches: Script<Vec<u8>>,
}

impl ScriptedRemote {
    /// Scripts a job that is accepted, succeeds on the first poll and
    /// downloads a valid model.
    pub fn happy_path(job_id: &str) -> Self {
        let remote = Self::default();
        remote.submits.push(Step::ok(job_id.to_string()));
        remote.polls.push(Step::ok(succeeded(job_id)));
        remote.fetches.push(Step::ok(glb()));
        remote
    }
}

#[async_trait]
impl RemoteJobClient for ScriptedRemote {
    async fn submit(&self, _subject_ref: &str) -> Result<String, JobError> {
        self.submits.next("submit").await
    }

    async fn poll(&self, _remote_job_id: &str) -> Result<RemoteJobStatus, JobError> {
        self.polls.next("poll").await
    }

    async fn fetch_result(&self, _result_ref: &str) -> Result<Vec<u8>, JobError> {
        self.fetches.next("fetch").await
    }
}

pub fn succeeded(job_id: &str) -> RemoteJobStatus {
    RemoteJobStatus::new(RemoteJobState::Succeeded, 100)
        .with_result_ref(format!("https://cdn.test/{job_id}.glb"))
}

pub fn running(progress: i64) -> RemoteJobStatus {
    RemoteJobStatus::new(RemoteJobState::Running, progress)
}

pub fn glb() -> Vec<u8> {
    b"glTF\x02\x00\x00\x00model".to_vec()
}

pub fn test_config(models_dir: &std::path::Path) -> GenerationConfig {
    GenerationConfig {
        max_retries: 3,
        max_concurrent_tasks: 5,
        poll_interval: Duration::from_millis(10),
        purge_grace: Duration::from_secs(3600),
        step_timeout: Duration::from_millis(100),
        models_dir: models_dir.to_path_buf(),
    }
}

/// A service wired to an in-memory store and a model writer in a temp dir.
pub struct Harness {
    pub service: GenerationService,
    pub store: MemoryTaskStore,
    pub remote: Arc<ScriptedRemote>,
    pub writer: ModelFileWriter,
    _models_dir: tempfile::TempDir,
}

impl Harness {
    pub fn new(remote: ScriptedRemote) -> Self {
        Self::with_config(remote, |_| {})
    }

    pub fn with_config(remote: ScriptedRemote, tweak: impl FnOnce(&mut GenerationConfig)) -> Self {
        let models_dir = tempfile::tempdir().unwrap();
        let mut config = test_config(models_dir.path());
        tweak(&mut config);

        let store = MemoryTaskStore::new();
        let remote = Arc::new(remote);
        let writer = ModelFileWriter::new(&config.models_dir);
        let service = GenerationService::new(
            Arc::new(store.clone()),
            remote.clone(),
            Arc::new(writer.clone()),
            &config,
        );

        Self {
            service,
            store,
            remote,
            writer,
            _models_dir: models_dir,
        }
    }
}

/// Write that lands right after a read, standing in for a poller step that
/// runs between a caller's check and its follow-up write.
#[derive(Clone, Copy)]
pub enum Interleaved {
    Finish(GenerationStatus),
    Vanish,
}

/// In-memory store that applies one [`Interleaved`] write after the next
/// `get`, while still returning the snapshot read before it.
pub struct RacingStore {
    pub inner: MemoryTaskStore,
    write: Interleaved,
    armed: AtomicBool,
}

impl RacingStore {
    pub fn new(write: Interleaved) -> Self {
        Self {
            inner: MemoryTaskStore::new(),
            write,
            armed: AtomicBool::new(false),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TaskStore for RacingStore {
    async fn create(&self, subject_ref: &str) -> StoreResult<GenerationTask> {
        self.inner.create(subject_ref).await
    }

    async fn get(&self, id: TaskId) -> StoreResult<Option<GenerationTask>> {
        let snapshot = self.inner.get(id).await?;
        if self.armed.swap(false, Ordering::SeqCst) {
            match self.write {
                Interleaved::Finish(status) => {
                    self.inner
                        .update(id, &TaskPatch::status(status).with_progress(100))
                        .await?;
                }
                Interleaved::Vanish => {
                    self.inner.delete(id).await?;
                }
            }
        }
        Ok(snapshot)
    }

    async fn list_active(&self) -> StoreResult<Vec<GenerationTask>> {
        self.inner.list_active().await
    }

    async fn list_all(&self) -> StoreResult<Vec<GenerationTask>> {
        self.inner.list_all().await
    }

    async fn count_active(&self) -> StoreResult<i64> {
        self.inner.count_active().await
    }

    async fn update(&self, id: TaskId, patch: &TaskPatch) -> StoreResult<Option<GenerationTask>> {
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: TaskId) -> StoreResult<bool> {
        self.inner.delete(id).await
    }

    async fn delete_active(&self, id: TaskId) -> StoreResult<bool> {
        self.inner.delete_active(id).await
    }

    async fn purge_older_than(&self, age: Duration) -> StoreResult<u64> {
        self.inner.purge_older_than(age).await
    }
}

/// Service over a [`RacingStore`], with a remote that is never reached.
pub fn racing_service(write: Interleaved) -> (GenerationService, Arc<RacingStore>) {
    let store = Arc::new(RacingStore::new(write));
    let service = GenerationService::new(
        store.clone(),
        Arc::new(ScriptedRemote::default()),
        Arc::new(ModelFileWriter::new(std::env::temp_dir())),
        &test_config(&std::env::temp_dir()),
    );
    (service, store)
}
