use std::time::Duration;

use roomdesigner_core::config::{env_optional, env_parse, env_string, ConfigError};

/// Default Meshy OpenAPI base URL.
pub const DEFAULT_API_BASE: &str = "https://api.meshy.ai/openapi/v1";

/// Meshy client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct MeshyConfig {
    /// Bearer credential. Absence is reported per call as a permanent
    /// failure rather than at startup.
    pub api_key: Option<String>,
    /// Base URL of the Meshy OpenAPI (no trailing slash).
    pub api_base: String,
    /// Public base URL Meshy uses to fetch furniture source images.
    pub asset_base_url: String,
    /// Timeout for submit and status calls.
    pub request_timeout: Duration,
    /// Timeout for downloading a finished model.
    pub download_timeout: Duration,
}

impl MeshyConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                            |
    /// |-------------------------------|------------------------------------|
    /// | `MESHY_API_KEY`               | unset                              |
    /// | `MESHY_API_BASE`              | `https://api.meshy.ai/openapi/v1`  |
    /// | `ASSET_BASE_URL`              | `http://localhost:8000`            |
    /// | `MESHY_REQUEST_TIMEOUT_SECS`  | `30`                               |
    /// | `MESHY_DOWNLOAD_TIMEOUT_SECS` | `120`                              |
    pub fn from_env() -> Result<Self, ConfigError> {
        let request_timeout_secs: u64 = env_parse("MESHY_REQUEST_TIMEOUT_SECS", 30, "u64")?;
        let download_timeout_secs: u64 = env_parse("MESHY_DOWNLOAD_TIMEOUT_SECS", 120, "u64")?;

        Ok(Self {
            api_key: env_optional("MESHY_API_KEY"),
            api_base: trim_base(env_string("MESHY_API_BASE", DEFAULT_API_BASE)),
            asset_base_url: trim_base(env_string("ASSET_BASE_URL", "http://localhost:8000")),
            request_timeout: Duration::from_secs(request_timeout_secs),
            download_timeout: Duration::from_secs(download_timeout_secs),
        })
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
