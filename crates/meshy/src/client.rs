//! [`RemoteJobClient`] backed by the Meshy image-to-3D API.

use async_trait::async_trait;
use roomdesigner_core::error::JobError;

use crate::api::{ImageTo3dTask, MeshyApi};
use crate::classify::classify;
use crate::config::MeshyConfig;
use crate::remote::{RemoteJobClient, RemoteJobState, RemoteJobStatus};

/// Meshy-backed remote job client.
///
/// Stateless apart from the HTTP connection pool, so a single instance is
/// shared across every task.
#[derive(Debug, Clone)]
pub struct MeshyClient {
    api: MeshyApi,
    asset_base_url: String,
}

impl MeshyClient {
    pub fn new(config: &MeshyConfig) -> Self {
        Self {
            api: MeshyApi::new(config),
            asset_base_url: config.asset_base_url.clone(),
        }
    }

    /// Public URL Meshy downloads the furniture source image from.
    pub fn image_url(&self, subject_ref: &str) -> String {
        format!(
            "{}/api/files/furniture/{}/image",
            self.asset_base_url, subject_ref
        )
    }
}

#[async_trait]
impl RemoteJobClient for MeshyClient {
    async fn submit(&self, subject_ref: &str) -> Result<String, JobError> {
        let image_url = self.image_url(subject_ref);
        let job_id = self
            .api
            .create_image_to_3d(&image_url)
            .await
            .map_err(|e| classify(&e))?;

        tracing::info!(subject_ref, remote_job_id = %job_id, "Meshy job submitted");
        Ok(job_id)
    }

    async fn poll(&self, remote_job_id: &str) -> Result<RemoteJobStatus, JobError> {
        let task = self
            .api
            .get_image_to_3d(remote_job_id)
            .await
            .map_err(|e| classify(&e))?;

        Ok(to_status(remote_job_id, &task))
    }

    async fn fetch_result(&self, result_ref: &str) -> Result<Vec<u8>, JobError> {
        self.api.download(result_ref).await.map_err(|e| classify(&e))
    }
}

/// Translate a Meshy task payload into the pipeline's view of it.
fn to_status(remote_job_id: &str, task: &ImageTo3dTask) -> RemoteJobStatus {
    let state = match task.status.as_str() {
        "PENDING" => RemoteJobState::Queued,
        "IN_PROGRESS" => RemoteJobState::Running,
        "SUCCEEDED" => RemoteJobState::Succeeded,
        "FAILED" | "CANCELED" | "EXPIRED" => RemoteJobState::Failed,
        other => {
            tracing::warn!(remote_job_id, status = other, "Unknown Meshy status, treating as running");
            RemoteJobState::Running
        }
    };

    let mut status = RemoteJobStatus::new(state, task.progress);
    if let Some(url) = task.glb_url() {
        status = status.with_result_ref(url);
    }
    if state == RemoteJobState::Failed {
        let message = task
            .error_message()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Meshy job {}", task.status.to_ascii_lowercase()));
        status = status.with_message(message);
    }
    status
}
