//! # Initialization
//!
//! Controller bootstrap: rustls setup, metrics, HTTP server, Kubernetes client,
//! change feed, work queue and worker pool.
//!
//! Both controllers share one loop shape: the feed fills the queue until
//! shutdown (or a fatal listing error), then the queue is shut down and the
//! workers are joined so in-flight reconciliations finish.

use crate::config::{ControllerConfig, ServerConfig};
use crate::controller::api::{KubeBackupApi, KubePodApi};
use crate::controller::drivers::redis::RedisConnector;
use crate::controller::feed::{ChangeFeed, FeedEvent};
use crate::controller::key::ResourceKey;
use crate::controller::labeler::{wants_label, PodLabeler};
use crate::controller::queue::WorkQueue;
use crate::controller::reconciler::BackupReconciler;
use crate::controller::worker::{spawn_workers, Reconcile};
use crate::crd::DatabaseBackup;
use crate::observability;
use crate::runtime::{kubeconfig, shutdown};
use crate::server::{start_server, ServerState};
use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Pod;
use kube::api::Api;
use kube::{Client, Resource};
use kube_runtime::watcher;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Configure rustls crypto provider before any TLS connection is made
fn install_crypto_provider() {
    // Err means a provider is already installed for this process
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }
}

fn scoped_api<K>(client: Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = k8s_openapi::NamespaceResourceScope>,
    K::DynamicType: Default,
{
    match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    }
}

/// Run the `DatabaseBackup` controller until SIGINT/SIGTERM
pub async fn run_backup_controller(
    config: ControllerConfig,
    server_config: ServerConfig,
) -> Result<()> {
    install_crypto_provider();
    info!("Starting DatabaseBackup controller");

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let backups: Api<DatabaseBackup> = scoped_api(client.clone(), config.watch_namespace.as_deref());

    let reconciler = Arc::new(BackupReconciler::new(
        KubeBackupApi::new(client),
        RedisConnector::new(config.datastore_connect_timeout()),
        &config,
    ));

    // Level-triggered: every event re-derives the full state
    run_controller(backups, reconciler, |_: &FeedEvent<DatabaseBackup>| true, &config, &server_config)
        .await
}

/// Run the Pod labeler until SIGINT/SIGTERM
pub async fn run_pod_labeler(
    config: ControllerConfig,
    server_config: ServerConfig,
    kubeconfig_path: Option<&Path>,
) -> Result<()> {
    install_crypto_provider();
    info!("Starting Pod labeler");

    let client = kubeconfig::client(kubeconfig_path).await?;
    let pods: Api<Pod> = scoped_api(client.clone(), config.watch_namespace.as_deref());

    let labeler = Arc::new(PodLabeler::new(KubePodApi::new(client), &config));
    run_controller(pods, labeler, wants_label, &config, &server_config).await
}

async fn run_controller<K, R, F>(
    api: Api<K>,
    reconciler: Arc<R>,
    select: F,
    config: &ControllerConfig,
    server_config: &ServerConfig,
) -> Result<()>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    R: Reconcile,
    F: Fn(&FeedEvent<K>) -> bool + Send,
{
    observability::metrics::register_metrics().context("Failed to register metrics")?;

    let (shutdown_tx, shutdown_rx) = shutdown::channel();
    shutdown::spawn_signal_handler(shutdown_tx);

    let feed = ChangeFeed::new(api, watcher::Config::default(), config.watch_restart_delay());
    let ready = feed.synced_flag();

    let server_state = Arc::new(ServerState::with_ready_flag(Arc::clone(&ready)));
    let port = server_config.metrics_port;
    let server_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        if let Err(e) = start_server(port, server_state, server_shutdown).await {
            error!("HTTP server error: {}", e);
        }
    });

    let queue: Arc<WorkQueue<ResourceKey>> = Arc::new(WorkQueue::new());
    let mut workers = spawn_workers(&queue, &reconciler, config.worker_count);

    let feed_result = feed.run(Arc::clone(&queue), select, shutdown_rx).await;

    ready.store(false, Ordering::Relaxed);
    info!(
        in_flight = queue.in_flight(),
        "Stopping workers, waiting for in-flight reconciliations"
    );
    queue.shut_down();
    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            error!("Worker task failed: {}", e);
        }
    }

    feed_result.context("Change feed failed")?;
    info!("Controller stopped");
    Ok(())
}
