//! # Backup Settings
//!
//! Validated view of a `DatabaseBackupSpec` with defaults applied.

use crate::constants::{
    MIN_BACKUP_INTERVAL_SECS, SUPPORTED_DATABASE_TYPE, SUPPORTED_STORAGE_TYPE,
};
use crate::controller::reconciler::duration::{parse_duration, DurationError};
use crate::crd::DatabaseBackupSpec;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Problems with the desired state itself; retrying without a spec edit cannot help
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("unsupported databaseType '{0}' (only 'redis' is supported)")]
    UnsupportedDatabaseType(String),
    #[error("connectionSecret must name a Secret")]
    MissingConnectionSecret,
    #[error("invalid backupInterval: {0}")]
    InvalidInterval(#[from] DurationError),
    #[error("backupInterval '{0}' is shorter than the 1s minimum")]
    IntervalTooShort(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSettings {
    pub database_name: String,
    pub address: String,
    pub connection_secret: String,
    pub directory: PathBuf,
    pub interval: Duration,
}

impl BackupSettings {
    pub fn from_spec(spec: &DatabaseBackupSpec) -> Result<Self, SettingsError> {
        let database_type = spec.database_type.trim();
        if !database_type.eq_ignore_ascii_case(SUPPORTED_DATABASE_TYPE) {
            return Err(SettingsError::UnsupportedDatabaseType(
                spec.database_type.clone(),
            ));
        }

        // Backups always land in backupDirectory; storageType only describes that volume
        let storage_type = spec.storage_type.trim();
        if !storage_type.is_empty() && !storage_type.eq_ignore_ascii_case(SUPPORTED_STORAGE_TYPE) {
            warn!(
                storage_type,
                "storageType is not 'local', writing to backupDirectory on the local filesystem"
            );
        }

        let connection_secret = spec.connection_secret.trim();
        if connection_secret.is_empty() {
            return Err(SettingsError::MissingConnectionSecret);
        }

        let interval = parse_duration(spec.backup_interval())?;
        if interval < Duration::from_secs(MIN_BACKUP_INTERVAL_SECS) {
            return Err(SettingsError::IntervalTooShort(
                spec.backup_interval().to_string(),
            ));
        }

        Ok(Self {
            database_name: spec.database_name.clone(),
            address: spec.redis_addr().to_string(),
            connection_secret: connection_secret.to_string(),
            directory: PathBuf::from(spec.backup_directory()),
            interval,
        })
    }
}
