//! # DatabaseBackup Spec
//!
//! Main CRD specification types and default values.

use crate::constants::{DEFAULT_BACKUP_DIRECTORY, DEFAULT_BACKUP_INTERVAL, DEFAULT_REDIS_ADDR};
use serde::{Deserialize, Serialize};

/// DatabaseBackup Custom Resource Definition
///
/// Declares a data store that should be dumped to durable storage on a fixed interval.
///
/// # Example
///
/// ```yaml
/// apiVersion: database.example.com/v1alpha1
/// kind: DatabaseBackup
/// metadata:
///   name: cache-backup
///   namespace: default
/// spec:
///   databaseName: cache
///   databaseType: redis
///   connectionSecret: redis-credentials
///   storageType: local
///   backupInterval: 10m
///   backupDirectory: /var/backups/cache
///   redisAddr: redis.default.svc:6379
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "DatabaseBackup",
    group = "database.example.com",
    version = "v1alpha1",
    namespaced,
    status = "crate::crd::DatabaseBackupStatus",
    shortname = "dbb",
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}, {"name":"Last Backup", "type":"date", "jsonPath":".status.lastBackupTime"}, {"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseBackupSpec {
    /// Logical name of the database being backed up
    pub database_name: String,
    /// Data store type. Only "redis" is supported.
    pub database_type: String,
    /// Name of the Secret (same namespace) holding the base64-encoded `password`
    pub connection_secret: String,
    /// Backup target. Only "local" (filesystem) is supported; empty means "local".
    #[serde(default)]
    pub storage_type: String,
    /// How often to take a backup
    /// Format: duration string (e.g., "30s", "5m", "1h30m")
    /// Default: "5m"
    #[serde(default = "default_backup_interval")]
    pub backup_interval: String,
    /// Directory that receives `backup_<unix-seconds>.txt` files
    /// Default: "/tmp/db_backups"
    #[serde(default = "default_backup_directory")]
    pub backup_directory: String,
    /// Network address of the data store (host:port)
    /// Default: "localhost:6379"
    #[serde(default = "default_redis_addr", alias = "dataStoreAddress")]
    pub redis_addr: String,
}

impl DatabaseBackupSpec {
    /// Backup interval with the default applied when empty
    #[must_use]
    pub fn backup_interval(&self) -> &str {
        non_empty_or(&self.backup_interval, DEFAULT_BACKUP_INTERVAL)
    }

    /// Backup directory with the default applied when empty
    #[must_use]
    pub fn backup_directory(&self) -> &str {
        non_empty_or(&self.backup_directory, DEFAULT_BACKUP_DIRECTORY)
    }

    /// Data-store address with the default applied when empty
    #[must_use]
    pub fn redis_addr(&self) -> &str {
        non_empty_or(&self.redis_addr, DEFAULT_REDIS_ADDR)
    }
}

fn non_empty_or<'a>(value: &'a str, default: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default
    } else {
        trimmed
    }
}

/// Default value for backup interval
pub fn default_backup_interval() -> String {
    DEFAULT_BACKUP_INTERVAL.to_string()
}

/// Default value for backup directory
pub fn default_backup_directory() -> String {
    DEFAULT_BACKUP_DIRECTORY.to_string()
}

/// Default value for the data-store address
pub fn default_redis_addr() -> String {
    DEFAULT_REDIS_ADDR.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let spec: DatabaseBackupSpec = serde_json::from_value(serde_json::json!({
            "databaseName": "cache",
            "databaseType": "redis",
            "connectionSecret": "redis-credentials",
            "storageType": "local"
        }))
        .unwrap();

        assert_eq!(spec.backup_interval(), "5m");
        assert_eq!(spec.backup_directory(), "/tmp/db_backups");
        assert_eq!(spec.redis_addr(), "localhost:6379");
    }

    #[test]
    fn test_empty_strings_fall_back_to_defaults() {
        let spec: DatabaseBackupSpec = serde_json::from_value(serde_json::json!({
            "databaseName": "cache",
            "databaseType": "redis",
            "connectionSecret": "redis-credentials",
            "storageType": "local",
            "backupInterval": "",
            "backupDirectory": " ",
            "redisAddr": ""
        }))
        .unwrap();

        assert_eq!(spec.backup_interval(), "5m");
        assert_eq!(spec.backup_directory(), "/tmp/db_backups");
        assert_eq!(spec.redis_addr(), "localhost:6379");
    }

    #[test]
    fn test_data_store_address_alias() {
        let spec: DatabaseBackupSpec = serde_json::from_value(serde_json::json!({
            "databaseName": "cache",
            "databaseType": "redis",
            "connectionSecret": "redis-credentials",
            "dataStoreAddress": "redis.cache.svc:6380"
        }))
        .unwrap();

        assert_eq!(spec.redis_addr(), "redis.cache.svc:6380");
        assert_eq!(spec.storage_type, "");
    }

    #[test]
    fn test_spec_serializes_camel_case() {
        let spec: DatabaseBackupSpec = serde_json::from_value(serde_json::json!({
            "databaseName": "cache",
            "databaseType": "redis",
            "connectionSecret": "redis-credentials",
            "storageType": "local",
            "backupInterval": "1m"
        }))
        .unwrap();

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["backupInterval"], "1m");
        assert_eq!(value["redisAddr"], "localhost:6379");
        assert_eq!(value["connectionSecret"], "redis-credentials");
    }
}
