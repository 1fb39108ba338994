//! # kube-list
//!
//! Lists the Pods in the current kubeconfig context's namespace.
//!
//! The kubeconfig is taken from `KUBECONFIG` when set, otherwise from
//! `$HOME/.kube/config`.
//!
//! ## Usage
//!
//! ```bash
//! kube-list
//! KUBECONFIG=/etc/kube/admin.conf kube-list
//! ```

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use database_backup_controller::runtime::kubeconfig;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};

/// List Pods in the current namespace
#[derive(Parser, Debug)]
#[command(name = "kube-list", version, about, long_about = None)]
struct Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let _cli = Cli::parse();
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_provider| anyhow!("Failed to install rustls crypto provider"))?;

    let path = kubeconfig::default_kubeconfig_path()
        .context("No kubeconfig found: set KUBECONFIG or HOME")?;
    let client = kubeconfig::client_from_kubeconfig(&path).await?;

    let pods: Api<Pod> = Api::default_namespaced(client);
    let list = pods
        .list(&ListParams::default())
        .await
        .context("Failed to list pods")?;

    for pod in list.items {
        println!("Pod Name: {}", pod.metadata.name.unwrap_or_default());
    }
    Ok(())
}
