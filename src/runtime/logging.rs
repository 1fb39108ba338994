//! # Logging
//!
//! `tracing-subscriber` setup. The filter comes from `RUST_LOG`, falling back
//! to `database_backup_controller=info`; `LOG_FORMAT=json` switches to
//! structured output.

use crate::config::LogFormat;
use crate::constants::DEFAULT_LOG_FILTER;
use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

pub fn init_tracing(format: LogFormat) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    }
    .map_err(|e| anyhow!("Failed to initialize tracing subscriber: {e}"))
}
