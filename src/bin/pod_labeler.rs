//! # Pod Labeler
//!
//! Watches Pods and labels every newly created Pod annotated with
//! `auto-label: "true"` as `managed-by: custom-controller`.
//!
//! ## Usage
//!
//! ```bash
//! # In cluster, or with the default kubeconfig
//! pod-labeler
//!
//! # With an explicit kubeconfig
//! pod-labeler --kubeconfig ~/.kube/staging.yaml
//! ```

use anyhow::Result;
use clap::Parser;
use database_backup_controller::config::{ControllerConfig, ServerConfig};
use database_backup_controller::runtime::{initialization, logging};
use std::path::PathBuf;

/// Label annotated Pods with managed-by=custom-controller
#[derive(Parser, Debug)]
#[command(name = "pod-labeler", version, about, long_about = None)]
struct Cli {
    /// Path to a kubeconfig file (in-cluster or default discovery when omitted)
    #[arg(long, value_name = "PATH")]
    kubeconfig: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ControllerConfig::from_env();
    logging::init_tracing(config.log_format)?;

    initialization::run_pod_labeler(config, ServerConfig::from_env(), cli.kubeconfig.as_deref())
        .await
}
