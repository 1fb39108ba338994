//! Common test utilities
//!
//! In-memory stand-ins for the Kubernetes API and the key-value store, plus
//! builders for the objects the reconcilers read.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use base64::Engine;
use database_backup_controller::controller::api::{ApiError, BackupApi, PodApi};
use database_backup_controller::controller::drivers::{
    DriverError, KeyValueConnector, KeyValueStore,
};
use database_backup_controller::controller::key::ResourceKey;
use database_backup_controller::crd::{DatabaseBackup, DatabaseBackupSpec, DatabaseBackupStatus};
use k8s_openapi::api::core::v1::{Pod, Secret};
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const NAMESPACE: &str = "default";
pub const SECRET_NAME: &str = "redis-credentials";
pub const PASSWORD: &str = "hunter2";

// ---------------------------------------------------------------------------
// Key-value store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct KvState {
    data: BTreeMap<String, String>,
    failing_keys: HashSet<String>,
    refuse_connections: bool,
    passwords_seen: Vec<String>,
}

/// Connector over a shared in-memory map
#[derive(Debug, Clone, Default)]
pub struct FakeKvConnector {
    state: Arc<Mutex<KvState>>,
}

impl FakeKvConnector {
    pub fn with_data(pairs: &[(&str, &str)]) -> Self {
        let connector = Self::default();
        {
            let mut state = connector.state.lock().unwrap();
            for (k, v) in pairs {
                state.data.insert((*k).to_string(), (*v).to_string());
            }
        }
        connector
    }

    /// Make reads of `key` fail
    pub fn fail_reads_of(&self, key: &str) {
        self.state.lock().unwrap().failing_keys.insert(key.to_string());
    }

    pub fn refuse_connections(&self, refuse: bool) {
        self.state.lock().unwrap().refuse_connections = refuse;
    }

    pub fn passwords_seen(&self) -> Vec<String> {
        self.state.lock().unwrap().passwords_seen.clone()
    }
}

#[derive(Debug)]
pub struct FakeKvStore {
    state: Arc<Mutex<KvState>>,
}

#[async_trait]
impl KeyValueStore for FakeKvStore {
    async fn keys(&mut self) -> Result<Vec<String>, DriverError> {
        Ok(self.state.lock().unwrap().data.keys().cloned().collect())
    }

    async fn get(&mut self, key: &str) -> Result<Option<String>, DriverError> {
        let state = self.state.lock().unwrap();
        if state.failing_keys.contains(key) {
            return Err(DriverError::ReadKey {
                key: key.to_string(),
                message: "WRONGTYPE Operation against a key holding the wrong kind of value"
                    .to_string(),
            });
        }
        Ok(state.data.get(key).cloned())
    }
}

#[async_trait]
impl KeyValueConnector for FakeKvConnector {
    type Store = FakeKvStore;

    async fn connect(&self, address: &str, password: &str) -> Result<FakeKvStore, DriverError> {
        let mut state = self.state.lock().unwrap();
        if state.refuse_connections {
            return Err(DriverError::Connect {
                address: address.to_string(),
                message: "Connection refused (os error 111)".to_string(),
            });
        }
        state.passwords_seen.push(password.to_string());
        Ok(FakeKvStore {
            state: Arc::clone(&self.state),
        })
    }
}

// ---------------------------------------------------------------------------
// DatabaseBackup API
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct BackupApiState {
    backups: HashMap<ResourceKey, DatabaseBackup>,
    secrets: HashMap<(String, String), Secret>,
    /// Status writes to reject with a conflict before accepting one
    pending_conflicts: u32,
    status_writes: Vec<DatabaseBackupStatus>,
    next_resource_version: u64,
}

impl BackupApiState {
    fn bump(&mut self, key: &ResourceKey) {
        self.next_resource_version += 1;
        let rv = self.next_resource_version.to_string();
        if let Some(backup) = self.backups.get_mut(key) {
            backup.metadata.resource_version = Some(rv);
        }
    }
}

/// In-memory API server for `DatabaseBackup` objects and Secrets
#[derive(Debug, Clone, Default)]
pub struct FakeBackupApi {
    state: Arc<Mutex<BackupApiState>>,
}

impl FakeBackupApi {
    pub fn insert_backup(&self, backup: DatabaseBackup) -> ResourceKey {
        let key = ResourceKey::from_resource(&backup).unwrap();
        let mut state = self.state.lock().unwrap();
        state.backups.insert(key.clone(), backup);
        state.bump(&key);
        key
    }

    /// Apply a spec edit the way the API server does: new generation and resourceVersion
    pub fn edit_spec(&self, key: &ResourceKey, edit: impl FnOnce(&mut DatabaseBackupSpec)) {
        let mut state = self.state.lock().unwrap();
        if let Some(backup) = state.backups.get_mut(key) {
            edit(&mut backup.spec);
            backup.metadata.generation = Some(backup.metadata.generation.unwrap_or(0) + 1);
        }
        state.bump(key);
    }

    pub fn delete_backup(&self, key: &ResourceKey) {
        self.state.lock().unwrap().backups.remove(key);
    }

    pub fn insert_secret(&self, namespace: &str, name: &str, secret: Secret) {
        self.state
            .lock()
            .unwrap()
            .secrets
            .insert((namespace.to_string(), name.to_string()), secret);
    }

    /// Reject the next `n` status writes as if another writer got there first
    pub fn inject_conflicts(&self, n: u32) {
        self.state.lock().unwrap().pending_conflicts = n;
    }

    pub fn status_writes(&self) -> Vec<DatabaseBackupStatus> {
        self.state.lock().unwrap().status_writes.clone()
    }

    pub fn status_of(&self, key: &ResourceKey) -> Option<DatabaseBackupStatus> {
        self.state
            .lock()
            .unwrap()
            .backups
            .get(key)
            .and_then(|b| b.status.clone())
    }
}

#[async_trait]
impl BackupApi for FakeBackupApi {
    async fn get(&self, key: &ResourceKey) -> Result<DatabaseBackup, ApiError> {
        self.state
            .lock()
            .unwrap()
            .backups
            .get(key)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, ApiError> {
        self.state
            .lock()
            .unwrap()
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn patch_status(
        &self,
        key: &ResourceKey,
        resource_version: Option<&str>,
        status: &DatabaseBackupStatus,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        if state.pending_conflicts > 0 {
            state.pending_conflicts -= 1;
            // Someone else updated the object in between
            state.bump(key);
            return Err(ApiError::Conflict(
                "the object has been modified; please apply your changes to the latest version"
                    .to_string(),
            ));
        }

        let Some(current) = state.backups.get(key) else {
            return Err(ApiError::NotFound);
        };
        if let Some(rv) = resource_version {
            if current.metadata.resource_version.as_deref() != Some(rv) {
                return Err(ApiError::Conflict("stale resourceVersion".to_string()));
            }
        }

        if let Some(backup) = state.backups.get_mut(key) {
            backup.status = Some(status.clone());
        }
        state.status_writes.push(status.clone());
        state.bump(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pod API
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct PodApiState {
    pods: HashMap<ResourceKey, Pod>,
    patches: Vec<(ResourceKey, BTreeMap<String, String>)>,
    fail_patches: bool,
}

/// In-memory API server for Pods that applies label merge patches
#[derive(Debug, Clone, Default)]
pub struct FakePodApi {
    state: Arc<Mutex<PodApiState>>,
}

impl FakePodApi {
    pub fn insert_pod(&self, pod: Pod) -> ResourceKey {
        let key = ResourceKey::from_resource(&pod).unwrap();
        self.state.lock().unwrap().pods.insert(key.clone(), pod);
        key
    }

    pub fn delete_pod(&self, key: &ResourceKey) {
        self.state.lock().unwrap().pods.remove(key);
    }

    pub fn fail_patches(&self, fail: bool) {
        self.state.lock().unwrap().fail_patches = fail;
    }

    pub fn patch_count(&self) -> usize {
        self.state.lock().unwrap().patches.len()
    }

    pub fn pod(&self, key: &ResourceKey) -> Option<Pod> {
        self.state.lock().unwrap().pods.get(key).cloned()
    }
}

#[async_trait]
impl PodApi for FakePodApi {
    async fn get(&self, key: &ResourceKey) -> Result<Pod, ApiError> {
        self.state
            .lock()
            .unwrap()
            .pods
            .get(key)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn patch_labels(
        &self,
        key: &ResourceKey,
        labels: &BTreeMap<String, String>,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_patches {
            return Err(ApiError::Other("etcdserver: request timed out".to_string()));
        }
        let Some(pod) = state.pods.get_mut(key) else {
            return Err(ApiError::NotFound);
        };
        pod.metadata
            .labels
            .get_or_insert_with(BTreeMap::new)
            .extend(labels.clone());
        state.patches.push((key.clone(), labels.clone()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// `DatabaseBackup` named `name` writing into `directory`, with extra spec fields merged in
pub fn backup(name: &str, directory: &Path, extra_spec: serde_json::Value) -> DatabaseBackup {
    let mut spec = serde_json::json!({
        "databaseName": "cache",
        "databaseType": "redis",
        "connectionSecret": SECRET_NAME,
        "storageType": "local",
        "backupDirectory": directory.display().to_string(),
        "redisAddr": "redis.default.svc:6379",
    });
    if let (Some(spec), Some(extra)) = (spec.as_object_mut(), extra_spec.as_object()) {
        for (k, v) in extra {
            spec.insert(k.clone(), v.clone());
        }
    }

    serde_json::from_value(serde_json::json!({
        "apiVersion": "database.example.com/v1alpha1",
        "kind": "DatabaseBackup",
        "metadata": { "name": name, "namespace": NAMESPACE, "generation": 1 },
        "spec": spec,
    }))
    .unwrap()
}

/// Secret holding `password` the way the controller expects it (base64 text)
pub fn password_secret(password: &str) -> Secret {
    let encoded = base64::engine::general_purpose::STANDARD.encode(password);
    Secret {
        metadata: ObjectMeta {
            name: Some(SECRET_NAME.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            ..Default::default()
        },
        data: Some(BTreeMap::from([(
            "password".to_string(),
            ByteString(encoded.into_bytes()),
        )])),
        ..Default::default()
    }
}

pub fn pod(name: &str, annotations: &[(&str, &str)]) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            annotations: Some(
                annotations
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
            ),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Files in `dir` named `backup_*.txt`, sorted
pub fn backup_files(dir: &Path) -> Vec<std::path::PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<_> = entries
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("backup_") && n.ends_with(".txt"))
        })
        .collect();
    files.sort();
    files
}
