use axum::http::HeaderValue;
use roomdesigner_core::config::{env_parse, env_string, ConfigError};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for the generation poller (default: `30`).
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `8000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_origins = env_string("CORS_ORIGINS", "http://localhost:5173");

        Ok(Self {
            host: env_string("HOST", "0.0.0.0"),
            port: env_parse("PORT", 8000, "u16")?,
            cors_origins: parse_origins(&raw_origins)?,
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", 30, "u64")?,
            shutdown_timeout_secs: env_parse("SHUTDOWN_TIMEOUT_SECS", 30, "u64")?,
        })
    }
}

/// Split a comma-separated origin list, rejecting entries that are not
/// valid header values.
fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|origin| match HeaderValue::from_str(origin) {
            Ok(_) => Ok(origin.to_string()),
            Err(_) => Err(ConfigError {
                key: "CORS_ORIGINS",
                expected: "comma-separated origin list",
                value: raw.to_string(),
            }),
        })
        .collect()
}
