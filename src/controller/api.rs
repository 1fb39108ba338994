//! # Kubernetes API Seams
//!
//! Narrow traits over the handful of API calls the reconcilers make, with
//! `kube`-backed implementations. Reconcilers only see `ApiError`, so they can
//! be driven by in-memory fakes in tests.

use crate::controller::key::ResourceKey;
use crate::crd::{DatabaseBackup, DatabaseBackupStatus};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, Secret};
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use std::collections::BTreeMap;
use thiserror::Error;

/// Classified Kubernetes API failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// 404: the object does not exist (any more)
    #[error("not found")]
    NotFound,
    /// 409: optimistic-concurrency conflict
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("{0}")]
    Other(String),
}

impl From<kube::Error> for ApiError {
    fn from(e: kube::Error) -> Self {
        match e {
            kube::Error::Api(api_err) if api_err.code == 404 => ApiError::NotFound,
            kube::Error::Api(api_err) if api_err.code == 409 => {
                ApiError::Conflict(api_err.message)
            }
            other => ApiError::Other(other.to_string()),
        }
    }
}

/// API calls made by the backup reconciler
#[async_trait]
pub trait BackupApi: Send + Sync + 'static {
    /// Read the current `DatabaseBackup`
    async fn get(&self, key: &ResourceKey) -> Result<DatabaseBackup, ApiError>;

    /// Read a Secret in `namespace`
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, ApiError>;

    /// Merge-patch the status subresource
    ///
    /// When `resource_version` is set the write is rejected with
    /// `ApiError::Conflict` if the object changed since it was read.
    async fn patch_status(
        &self,
        key: &ResourceKey,
        resource_version: Option<&str>,
        status: &DatabaseBackupStatus,
    ) -> Result<(), ApiError>;
}

/// `BackupApi` backed by a Kubernetes client
#[derive(Clone)]
pub struct KubeBackupApi {
    client: Client,
}

impl KubeBackupApi {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl std::fmt::Debug for KubeBackupApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeBackupApi").finish_non_exhaustive()
    }
}

#[async_trait]
impl BackupApi for KubeBackupApi {
    async fn get(&self, key: &ResourceKey) -> Result<DatabaseBackup, ApiError> {
        let api: Api<DatabaseBackup> = Api::namespaced(self.client.clone(), &key.namespace);
        Ok(api.get(&key.name).await?)
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, ApiError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get(name).await?)
    }

    async fn patch_status(
        &self,
        key: &ResourceKey,
        resource_version: Option<&str>,
        status: &DatabaseBackupStatus,
    ) -> Result<(), ApiError> {
        let api: Api<DatabaseBackup> = Api::namespaced(self.client.clone(), &key.namespace);
        let patch = status_patch(resource_version, status);
        api.patch_status(&key.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

/// Merge document for a status write, pinned to `resource_version` when given
fn status_patch(resource_version: Option<&str>, status: &DatabaseBackupStatus) -> serde_json::Value {
    match resource_version {
        Some(rv) => serde_json::json!({
            "metadata": { "resourceVersion": rv },
            "status": status,
        }),
        None => serde_json::json!({ "status": status }),
    }
}

/// API calls made by the Pod labeler
#[async_trait]
pub trait PodApi: Send + Sync + 'static {
    async fn get(&self, key: &ResourceKey) -> Result<Pod, ApiError>;

    /// Merge-patch `labels` into the Pod, leaving every other field untouched
    async fn patch_labels(
        &self,
        key: &ResourceKey,
        labels: &BTreeMap<String, String>,
    ) -> Result<(), ApiError>;
}

/// `PodApi` backed by a Kubernetes client
#[derive(Clone)]
pub struct KubePodApi {
    client: Client,
}

impl KubePodApi {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl std::fmt::Debug for KubePodApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubePodApi").finish_non_exhaustive()
    }
}

#[async_trait]
impl PodApi for KubePodApi {
    async fn get(&self, key: &ResourceKey) -> Result<Pod, ApiError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), &key.namespace);
        Ok(api.get(&key.name).await?)
    }

    async fn patch_labels(
        &self,
        key: &ResourceKey,
        labels: &BTreeMap<String, String>,
    ) -> Result<(), ApiError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), &key.namespace);
        let patch = serde_json::json!({ "metadata": { "labels": labels } });
        api.patch(&key.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}
