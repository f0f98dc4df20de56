//! Service configuration: HTTP binding, queue bounds and job tuning.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::WorkerPoolConfig;
use crate::core::ConfigError;

/// Prefix for environment variables read by [`ServiceConfig::from_env`].
pub const ENV_PREFIX: &str = "DEFERRED_JOBS_";

/// Root service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Worker pool settings.
    pub pool: WorkerPoolConfig,
    /// Maximum jobs held in the scheduled set.
    pub max_scheduled: usize,
    /// How often the scheduled set is polled for due jobs, in milliseconds.
    pub poll_interval_ms: u64,
    /// Simulated work duration of `HelloJob`, in milliseconds.
    pub hello_job_work_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".into(),
            pool: WorkerPoolConfig::default(),
            max_scheduled: 10_000,
            poll_interval_ms: 1000,
            hello_job_work_ms: 5000,
        }
    }
}

impl ServiceConfig {
    /// Poll interval as a duration.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// `HelloJob` work duration.
    #[must_use]
    pub const fn hello_job_work(&self) -> Duration {
        Duration::from_millis(self.hello_job_work_ms)
    }

    /// Validate all values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_addr.trim().is_empty() {
            return Err(ConfigError::Invalid("bind_addr must not be empty".into()));
        }
        self.pool
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("pool: {e}")))?;
        if self.max_scheduled == 0 {
            return Err(ConfigError::Invalid(
                "max_scheduled must be greater than 0".into(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] for values that fail validation.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(input)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from defaults overridden by `DEFERRED_JOBS_*`
    /// environment variables. A `.env` file in the working directory is loaded
    /// first if present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] for unparsable values and
    /// [`ConfigError::Invalid`] for a malformed `.env` file or values that
    /// fail validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        check_env_file(dotenvy::dotenv().map(|_| ()))?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ServiceConfig::from_env`], loading variables from `path`
    /// instead of `.env`. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Same as [`ServiceConfig::from_env`].
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        check_env_file(dotenvy::from_path(path.as_ref()))?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ServiceConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(addr) = lookup(&format!("{ENV_PREFIX}BIND_ADDR")) {
            cfg.bind_addr = addr;
        }
        override_parsed(&lookup, "WORKER_COUNT", &mut cfg.pool.worker_count)?;
        override_parsed(&lookup, "MAX_QUEUE_DEPTH", &mut cfg.pool.max_queue_depth)?;
        override_parsed(&lookup, "THREAD_STACK_SIZE", &mut cfg.pool.thread_stack_size)?;
        override_parsed(
            &lookup,
            "SHUTDOWN_TIMEOUT_SECS",
            &mut cfg.pool.shutdown_timeout_secs,
        )?;
        override_parsed(&lookup, "MAX_SCHEDULED", &mut cfg.max_scheduled)?;
        override_parsed(&lookup, "POLL_INTERVAL_MS", &mut cfg.poll_interval_ms)?;
        override_parsed(&lookup, "HELLO_JOB_WORK_MS", &mut cfg.hello_job_work_ms)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

fn check_env_file(result: Result<(), dotenvy::Error>) -> Result<(), ConfigError> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(ConfigError::Invalid(format!(".env: {e}"))),
    }
}

fn override_parsed<F, T>(lookup: &F, suffix: &str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let key = format!("{ENV_PREFIX}{suffix}");
    let Some(raw) = lookup(&key) else {
        return Ok(());
    };
    match raw.trim().parse() {
        Ok(value) => {
            *slot = value;
            Ok(())
        }
        Err(_) => Err(ConfigError::InvalidEnv { key, value: raw }),
    }
}
