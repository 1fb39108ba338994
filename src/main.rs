//! # DatabaseBackup Controller
//!
//! Kubernetes controller that periodically dumps key-value stores described by
//! `DatabaseBackup` resources into timestamped backup files.
//!
//! ## Overview
//!
//! 1. **Watching resources** - lists and watches `DatabaseBackup` objects (all
//!    namespaces, or `WATCH_NAMESPACE`)
//! 2. **Resolving credentials** - reads the password from the Secret named by
//!    `connectionSecret`
//! 3. **Backing up** - writes every key as `key: value` into
//!    `backup_<unix-seconds>.txt` under `backupDirectory`
//! 4. **Reporting** - records phase, last backup time and errors in `status`
//!
//! Configuration comes from environment variables; see `ControllerConfig`.

use anyhow::Result;
use database_backup_controller::config::{ControllerConfig, ServerConfig};
use database_backup_controller::runtime::{initialization, logging};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ControllerConfig::from_env();
    logging::init_tracing(config.log_format)?;
    info!(
        workers = config.worker_count,
        namespace = config.watch_namespace.as_deref().unwrap_or("<all>"),
        "Configuration loaded"
    );

    initialization::run_backup_controller(config, ServerConfig::from_env()).await
}
