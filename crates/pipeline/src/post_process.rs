//! Turning a downloaded job result into a stored asset.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use roomdesigner_core::error::JobError;

/// Leading bytes of every binary glTF (GLB) file.
const GLB_MAGIC: &[u8; 4] = b"glTF";

/// Consumes the artifact of a succeeded remote job.
///
/// Failures are classified like remote failures: [`JobError::Retryable`]
/// sends the task back through the retry policy, [`JobError::Permanent`]
/// fails it.
#[async_trait]
pub trait ResultPostProcessor: Send + Sync {
    async fn process(&self, subject_ref: &str, payload: Vec<u8>) -> Result<(), JobError>;
}

/// Stores generated GLB models as `{models_dir}/{subject_ref}.glb`.
///
/// The file is written under a temporary name and renamed into place, so
/// readers never observe a partial model.
#[derive(Debug, Clone)]
pub struct ModelFileWriter {
    models_dir: PathBuf,
}

impl ModelFileWriter {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Final location of the model for `subject_ref`.
    pub fn model_path(&self, subject_ref: &str) -> PathBuf {
        self.models_dir.join(format!("{subject_ref}.glb"))
    }
}

#[async_trait]
impl ResultPostProcessor for ModelFileWriter {
    async fn process(&self, subject_ref: &str, payload: Vec<u8>) -> Result<(), JobError> {
        validate_subject_ref(subject_ref)?;
        validate_glb(&payload)?;

        let path = self.model_path(subject_ref);
        let tmp_path = self.models_dir.join(format!("{subject_ref}.glb.tmp"));

        tokio::fs::create_dir_all(&self.models_dir)
            .await
            .map_err(|e| io_failure("create models directory", &self.models_dir, e))?;
        tokio::fs::write(&tmp_path, &payload)
            .await
            .map_err(|e| io_failure("write model", &tmp_path, e))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| io_failure("move model into place", &path, e))?;

        tracing::info!(
            subject_ref,
            path = %path.display(),
            bytes = payload.len(),
            "Generated model stored",
        );
        Ok(())
    }
}

/// Reject references that would escape the models directory.
fn validate_subject_ref(subject_ref: &str) -> Result<(), JobError> {
    let valid = !subject_ref.is_empty()
        && subject_ref != "."
        && subject_ref != ".."
        && !subject_ref.contains(['/', '\\', '\0']);
    if valid {
        Ok(())
    } else {
        Err(JobError::permanent(format!(
            "Invalid subject reference for model file: {subject_ref:?}"
        )))
    }
}

fn validate_glb(payload: &[u8]) -> Result<(), JobError> {
    if payload.is_empty() {
        return Err(JobError::permanent("Downloaded model is empty"));
    }
    if !payload.starts_with(GLB_MAGIC) {
        return Err(JobError::permanent("Downloaded model is not a GLB file"));
    }
    Ok(())
}

fn io_failure(action: &str, path: &Path, err: std::io::Error) -> JobError {
    JobError::retryable(format!("Failed to {action} at {}: {err}", path.display()))
}
