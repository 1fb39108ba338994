//! # Configuration
//!
//! Process-level settings, built once at startup from environment variables and
//! handed to each component by reference.

mod controller;
mod server;

pub use controller::{ControllerConfig, LogFormat};
pub use server::ServerConfig;

/// Read environment variable or return default value
pub(crate) fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as string, treating empty values as unset
pub(crate) fn env_var_opt_str(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
