//! # Server Configuration
//!
//! Settings for the metrics/probe HTTP server.

use super::env_var_or_default;
use crate::constants::DEFAULT_METRICS_PORT;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port for `/metrics`, `/healthz` and `/readyz`
    pub metrics_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `METRICS_PORT`
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            metrics_port: env_var_or_default("METRICS_PORT", DEFAULT_METRICS_PORT),
        }
    }
}
