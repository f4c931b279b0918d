#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use roomdesigner_core::error::JobError;
use roomdesigner_db::MemoryTaskStore;
use roomdesigner_meshy::{RemoteJobClient, RemoteJobState, RemoteJobStatus};
use roomdesigner_pipeline::{GenerationConfig, GenerationService, ResultPostProcessor};
use serde_json::Value;
use tower::ServiceExt;

use roomdesigner_api::config::ServerConfig;
use roomdesigner_api::router::build_app_router;
use roomdesigner_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
    }
}

/// Remote service that accepts every job and finishes it on the first poll.
#[derive(Default)]
pub struct InstantRemote {
    submitted: AtomicUsize,
}

#[async_trait]
impl RemoteJobClient for InstantRemote {
    async fn submit(&self, _subject_ref: &str) -> Result<String, JobError> {
        let n = self.submitted.fetch_add(1, Ordering::SeqCst);
        Ok(format!("job-{n}"))
    }

    async fn poll(&self, remote_job_id: &str) -> Result<RemoteJobStatus, JobError> {
        Ok(RemoteJobStatus::new(RemoteJobState::Succeeded, 100)
            .with_result_ref(format!("https://cdn.test/{remote_job_id}.glb")))
    }

    async fn fetch_result(&self, _result_ref: &str) -> Result<Vec<u8>, JobError> {
        Ok(b"glTF\x02\x00\x00\x00".to_vec())
    }
}

/// Post-processor that accepts every payload without storing it.
pub struct DiscardResult;

#[async_trait]
impl ResultPostProcessor for DiscardResult {
    async fn process(&self, _subject_ref: &str, _payload: Vec<u8>) -> Result<(), JobError> {
        Ok(())
    }
}

/// Full application router plus direct access to the generation service,
/// so tests can drive poller iterations deterministically.
pub struct TestApp {
    pub router: Router,
    pub generation: Arc<GenerationService>,
    pub store: MemoryTaskStore,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_capacity(5)
    }

    pub fn with_capacity(max_concurrent_tasks: i64) -> Self {
        let config = test_config();
        let generation_config = GenerationConfig {
            max_concurrent_tasks,
            step_timeout: Duration::from_secs(1),
            ..GenerationConfig::default()
        };

        let store = MemoryTaskStore::new();
        let generation = Arc::new(GenerationService::new(
            Arc::new(store.clone()),
            Arc::new(InstantRemote::default()),
            Arc::new(DiscardResult),
            &generation_config,
        ));

        let state = AppState {
                generation: Arc::clone(&generation),
        };

        Self {
            router: build_app_router(state, &config),
            generation,
            store,
        }
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Method::GET, uri, Body::empty(), None).await
    }

    pub async fn delete(&self, uri: &str) -> Response<Body> {
        self.send(Method::DELETE, uri, Body::empty(), None).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> Response<Body> {
        self.send(
            Method::POST,
            uri,
            Body::from(body.to_string()),
            Some("application/json"),
        )
        .await
    }

    /// Create a task through the API and return its id.
    pub async fn create_task(&self, subject_ref: &str) -> String {
        let response = self
            .post_json(
                "/api/v1/generation/tasks",
                serde_json::json!({ "subject_ref": subject_ref }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        json["data"]["task_id"].as_str().unwrap().to_string()
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Body,
        content_type: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
