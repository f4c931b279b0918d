//! Maps Meshy API failures onto [`JobError`].
//!
//! Only failures that cannot succeed on a retry are permanent: missing
//! credentials and 4xx rejections other than 408/429. Everything else,
//! unrecognised failures included, is retryable.

use roomdesigner_core::error::JobError;

use crate::api::MeshyApiError;

/// Message returned when Meshy rejects a request because of the plan tier.
pub const SUBSCRIPTION_REQUIRED: &str =
    "Meshy subscription required: upgrade the plan to use the image-to-3D API";

pub fn classify(err: &MeshyApiError) -> JobError {
    match err {
        MeshyApiError::MissingApiKey => JobError::permanent(err.to_string()),
        MeshyApiError::Request(e) if e.is_timeout() => {
            JobError::retryable(format!("Meshy request timed out: {e}"))
        }
        MeshyApiError::Request(e) => JobError::retryable(format!("Meshy request failed: {e}")),
        MeshyApiError::ApiError { status, message } => classify_status(*status, message),
        MeshyApiError::MissingJobId => JobError::retryable(err.to_string()),
    }
}

fn classify_status(status: u16, message: &str) -> JobError {
    match status {
        408 | 429 | 500..=599 => {
            JobError::retryable(format!("Meshy API returned {status}: {message}"))
        }
        400..=499 if mentions_plan_limit(message) => JobError::permanent(SUBSCRIPTION_REQUIRED),
        400..=499 => JobError::permanent(format!("Meshy API rejected request ({status}): {message}")),
        _ => JobError::retryable(format!("Meshy API returned {status}: {message}")),
    }
}

fn mentions_plan_limit(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("free plan") || lower.contains("upgrade")
}
