//! # Kubeconfig
//!
//! Kubeconfig discovery for the out-of-cluster tools: an explicit path wins,
//! then the first entry of `KUBECONFIG`, then `$HOME/.kube/config`.

use anyhow::{Context, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve the kubeconfig path from a `KUBECONFIG` value and a home directory
#[must_use]
pub fn resolve_kubeconfig_path(
    kubeconfig_env: Option<OsString>,
    home: Option<PathBuf>,
) -> Option<PathBuf> {
    let from_env = kubeconfig_env
        .as_deref()
        .and_then(|value| std::env::split_paths(value).find(|p| !p.as_os_str().is_empty()));

    from_env.or_else(|| home.map(|home| home.join(".kube").join("config")))
}

/// Kubeconfig path for the current process environment
#[must_use]
pub fn default_kubeconfig_path() -> Option<PathBuf> {
    resolve_kubeconfig_path(
        std::env::var_os("KUBECONFIG"),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

/// Build a client from the kubeconfig file at `path`, using its current context
pub async fn client_from_kubeconfig(path: &Path) -> Result<Client> {
    debug!(path = %path.display(), "Loading kubeconfig");
    let kubeconfig = Kubeconfig::read_from(path)
        .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;
    let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .with_context(|| format!("Invalid kubeconfig {}", path.display()))?;
    Client::try_from(config).context("Failed to create Kubernetes client")
}

/// Client from `explicit` when given, otherwise inferred (in-cluster or default kubeconfig)
pub async fn client(explicit: Option<&Path>) -> Result<Client> {
    match explicit {
        Some(path) => client_from_kubeconfig(path).await,
        None => Client::try_default()
            .await
            .context("Failed to create Kubernetes client"),
    }
}
