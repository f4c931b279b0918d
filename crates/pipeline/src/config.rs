use std::path::PathBuf;
use std::time::Duration;

use roomdesigner_core::config::{env_parse, env_string, ConfigError};

/// Default directory generated furniture models are written to.
pub const DEFAULT_MODELS_DIR: &str = "storage/furniture/models";

/// Tuning for the generation pipeline.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Retryable failures tolerated per task before it is failed.
    pub max_retries: i32,
    /// Admission limit on non-terminal tasks.
    pub max_concurrent_tasks: i64,
    /// Sleep between poller iterations.
    pub poll_interval: Duration,
    /// How long terminal tasks stay readable before being purged.
    pub purge_grace: Duration,
    /// Upper bound on any single remote or post-processing call.
    pub step_timeout: Duration,
    pub models_dir: PathBuf,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_concurrent_tasks: 5,
            poll_interval: Duration::from_secs(5),
            purge_grace: Duration::from_secs(3600),
            step_timeout: Duration::from_secs(180),
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
        }
    }
}

impl GenerationConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                           | Default                    |
    /// |-----------------------------------|----------------------------|
    /// | `GENERATION_MAX_RETRIES`          | `3`                        |
    /// | `GENERATION_MAX_CONCURRENT_TASKS` | `5`                        |
    /// | `GENERATION_POLL_INTERVAL_SECS`   | `5`                        |
    /// | `GENERATION_PURGE_GRACE_SECS`     | `3600`                     |
    /// | `GENERATION_STEP_TIMEOUT_SECS`    | `180`                      |
    /// | `FURNITURE_MODELS_DIR`            | `storage/furniture/models` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let poll_interval_secs: u64 = env_parse(
            "GENERATION_POLL_INTERVAL_SECS",
            defaults.poll_interval.as_secs(),
            "u64",
        )?;
        let purge_grace_secs: u64 = env_parse(
            "GENERATION_PURGE_GRACE_SECS",
            defaults.purge_grace.as_secs(),
            "u64",
        )?;
        let step_timeout_secs: u64 = env_parse(
            "GENERATION_STEP_TIMEOUT_SECS",
            defaults.step_timeout.as_secs(),
            "u64",
        )?;

        Ok(Self {
            max_retries: env_parse("GENERATION_MAX_RETRIES", defaults.max_retries, "i32")?
                .max(0),
            max_concurrent_tasks: env_parse(
                "GENERATION_MAX_CONCURRENT_TASKS",
                defaults.max_concurrent_tasks,
                "i64",
            )?,
            poll_interval: Duration::from_secs(poll_interval_secs),
            purge_grace: Duration::from_secs(purge_grace_secs),
            step_timeout: Duration::from_secs(step_timeout_secs),
            models_dir: PathBuf::from(env_string("FURNITURE_MODELS_DIR", DEFAULT_MODELS_DIR)),
        })
    }
}
