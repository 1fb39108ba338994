//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use super::{env_var_opt_str, env_var_or_default};
use crate::constants::{
    DEFAULT_DATASTORE_CONNECT_TIMEOUT_SECS, DEFAULT_ERROR_REQUEUE_MAX_SECS,
    DEFAULT_ERROR_REQUEUE_MIN_SECS, DEFAULT_WATCH_RESTART_DELAY_SECS, DEFAULT_WORKER_COUNT,
};
use std::time::Duration;

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Number of workers pulling keys from the work queue
    pub worker_count: usize,
    /// First failure requeue delay (seconds)
    pub error_requeue_min_secs: u64,
    /// Maximum failure requeue delay (seconds)
    pub error_requeue_max_secs: u64,
    /// Delay before re-listing after the watch disconnects (seconds)
    pub watch_restart_delay_secs: u64,
    /// Data-store connect timeout (seconds)
    pub datastore_connect_timeout_secs: u64,
    /// Restrict the watch to one namespace; all namespaces when `None`
    pub watch_namespace: Option<String>,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            error_requeue_min_secs: DEFAULT_ERROR_REQUEUE_MIN_SECS,
            error_requeue_max_secs: DEFAULT_ERROR_REQUEUE_MAX_SECS,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            datastore_connect_timeout_secs: DEFAULT_DATASTORE_CONNECT_TIMEOUT_SECS,
            watch_namespace: None,
            log_format: LogFormat::Text,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        let error_requeue_min_secs =
            env_var_or_default("ERROR_REQUEUE_MIN_SECS", DEFAULT_ERROR_REQUEUE_MIN_SECS).max(1);
        Self {
            worker_count: env_var_or_default("WORKER_COUNT", DEFAULT_WORKER_COUNT).max(1),
            error_requeue_min_secs,
            error_requeue_max_secs: env_var_or_default(
                "ERROR_REQUEUE_MAX_SECS",
                DEFAULT_ERROR_REQUEUE_MAX_SECS,
            )
            .max(error_requeue_min_secs),
            watch_restart_delay_secs: env_var_or_default(
                "WATCH_RESTART_DELAY_SECS",
                DEFAULT_WATCH_RESTART_DELAY_SECS,
            ),
            datastore_connect_timeout_secs: env_var_or_default(
                "DATASTORE_CONNECT_TIMEOUT_SECS",
                DEFAULT_DATASTORE_CONNECT_TIMEOUT_SECS,
            )
            .max(1),
            watch_namespace: env_var_opt_str("WATCH_NAMESPACE"),
            log_format: env_var_or_default("LOG_FORMAT", LogFormat::Text),
        }
    }

    /// Get watch restart delay duration
    #[must_use]
    pub fn watch_restart_delay(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }

    /// Get data-store connect timeout
    #[must_use]
    pub fn datastore_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.datastore_connect_timeout_secs)
    }
}
