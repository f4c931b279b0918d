//! REST API client for the Meshy image-to-3D endpoints.
//!
//! Wraps job creation, status retrieval and result download using
//! [`reqwest`]. Errors are reported raw here; [`crate::classify`] turns
//! them into retryable/permanent outcomes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::MeshyConfig;

/// HTTP client for the Meshy OpenAPI.
#[derive(Debug, Clone)]
pub struct MeshyApi {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    request_timeout: Duration,
    download_timeout: Duration,
}

/// Body of `POST /image-to-3d`.
#[derive(Debug, Serialize)]
pub struct CreateImageTo3dRequest<'a> {
    pub image_url: &'a str,
    pub should_remesh: bool,
    pub enable_pbr: bool,
}

/// Response returned by `POST /image-to-3d` after queuing a job.
#[derive(Debug, Deserialize)]
pub struct CreateImageTo3dResponse {
    /// Server-assigned job identifier.
    pub result: Option<String>,
}

/// Response returned by `GET /image-to-3d/{id}`.
#[derive(Debug, Deserialize)]
pub struct ImageTo3dTask {
    #[serde(default)]
    pub id: Option<String>,
    /// `PENDING`, `IN_PROGRESS`, `SUCCEEDED`, `FAILED`, `CANCELED` or `EXPIRED`.
    pub status: String,
    #[serde(default)]
    pub progress: i64,
    #[serde(default)]
    pub model_urls: Option<ModelUrls>,
    #[serde(default)]
    pub task_error: Option<TaskError>,
    /// Older API revisions report the failure reason at the top level.
    #[serde(default)]
    pub message: Option<String>,
}

/// Download locations for the generated model formats.
#[derive(Debug, Deserialize)]
pub struct ModelUrls {
    #[serde(default)]
    pub glb: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaskError {
    #[serde(default)]
    pub message: Option<String>,
}

impl ImageTo3dTask {
    /// Failure reason, preferring the structured `task_error` field.
    pub fn error_message(&self) -> Option<&str> {
        self.task_error
            .as_ref()
            .and_then(|e| e.message.as_deref())
            .or(self.message.as_deref())
            .filter(|m| !m.is_empty())
    }

    pub fn glb_url(&self) -> Option<&str> {
        self.model_urls
            .as_ref()
            .and_then(|urls| urls.glb.as_deref())
            .filter(|url| !url.is_empty())
    }
}

/// Errors from the Meshy REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum MeshyApiError {
    /// No API key configured; raised before any request is sent.
    #[error("MESHY_API_KEY environment variable not configured")]
    MissingApiKey,

    /// The HTTP request itself failed (timeout, network, DNS, TLS, body decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Meshy returned a non-2xx status code.
    #[error("Meshy API error ({status}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// `message` from the JSON error body, or the raw body text.
        message: String,
    },

    /// Job creation succeeded at the HTTP level but carried no job id.
    #[error("Meshy API did not return a task ID")]
    MissingJobId,
}

impl MeshyApi {
    /// Create an API client from configuration.
    pub fn new(config: &MeshyConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &MeshyConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
            request_timeout: config.request_timeout,
            download_timeout: config.download_timeout,
        }
    }

    /// Queue an image-to-3D job for the image at `image_url`.
    ///
    /// Returns the Meshy job id.
    pub async fn create_image_to_3d(&self, image_url: &str) -> Result<String, MeshyApiError> {
        let api_key = self.api_key()?;
        let body = CreateImageTo3dRequest {
            image_url,
            should_remesh: true,
            enable_pbr: false,
        };

        let response = self
            .client
            .post(format!("{}/image-to-3d", self.api_base))
            .bearer_auth(api_key)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await?;

        let created: CreateImageTo3dResponse = Self::parse_response(response).await?;
        created
            .result
            .filter(|id| !id.is_empty())
            .ok_or(MeshyApiError::MissingJobId)
    }

    /// Fetch the current state of a job.
    pub async fn get_image_to_3d(&self, job_id: &str) -> Result<ImageTo3dTask, MeshyApiError> {
        let api_key = self.api_key()?;

        let response = self
            .client
            .get(format!("{}/image-to-3d/{}", self.api_base, job_id))
            .bearer_auth(api_key)
            .timeout(self.request_timeout)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Download a finished model from its (pre-signed) URL.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, MeshyApiError> {
        let response = self
            .client
            .get(url)
            .timeout(self.download_timeout)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    // ---- private helpers ----

    fn api_key(&self) -> Result<&str, MeshyApiError> {
        self.api_key.as_deref().ok_or(MeshyApiError::MissingApiKey)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`MeshyApiError::ApiError`]
    /// carrying the status and error message on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, MeshyApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(MeshyApiError::ApiError {
                status: status.as_u16(),
                message: error_message_from_body(&body),
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, MeshyApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Extract `message` from a JSON error body, falling back to the raw text.
fn error_message_from_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
