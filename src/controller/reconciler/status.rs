//! # Status Writer
//!
//! Persists the outcome of a reconciliation through the status subresource.
//! Writes are pinned to the `resourceVersion` that was read. On a conflict the
//! object is re-read, the status rebuilt from the fresh copy and the write
//! retried once; a second conflict fails the reconciliation.

use crate::controller::api::{ApiError, BackupApi};
use crate::controller::drivers::BackupReport;
use crate::controller::key::ResourceKey;
use crate::crd::{BackupPhase, DatabaseBackup, DatabaseBackupStatus};
use crate::observability::metrics;
use kube::ResourceExt;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    /// The object was deleted while the status was being written
    #[error("resource was deleted")]
    Gone,
    #[error("status update conflicted twice")]
    Conflict,
    #[error("status update failed: {0}")]
    Api(ApiError),
}

/// Write the status produced by `build` for `key`
///
/// `build` receives the object the write is based on, so fields that must be
/// preserved (e.g. `lastBackupTime` after a failure) are taken from the same
/// version the write is pinned to.
pub async fn write_status<A, F>(
    api: &A,
    key: &ResourceKey,
    observed: &DatabaseBackup,
    build: F,
) -> Result<(), StatusError>
where
    A: BackupApi + ?Sized,
    F: Fn(&DatabaseBackup) -> DatabaseBackupStatus + Send + Sync,
{
    let status = build(observed);
    match api
        .patch_status(key, observed.resource_version().as_deref(), &status)
        .await
    {
        Ok(()) => {
            debug!(phase = %status.phase, "Status written");
            return Ok(());
        }
        Err(ApiError::Conflict(message)) => {
            metrics::increment_status_conflicts();
            warn!("Status write conflicted, re-reading before retry: {}", message);
        }
        Err(ApiError::NotFound) => return Err(StatusError::Gone),
        Err(e) => return Err(StatusError::Api(e)),
    }

    let fresh = match api.get(key).await {
        Ok(fresh) => fresh,
        Err(ApiError::NotFound) => return Err(StatusError::Gone),
        Err(e) => return Err(StatusError::Api(e)),
    };
    let status = build(&fresh);
    match api
        .patch_status(key, fresh.resource_version().as_deref(), &status)
        .await
    {
        Ok(()) => {
            debug!(phase = %status.phase, "Status written after retry");
            Ok(())
        }
        Err(ApiError::Conflict(_)) => {
            metrics::increment_status_conflicts();
            Err(StatusError::Conflict)
        }
        Err(ApiError::NotFound) => Err(StatusError::Gone),
        Err(e) => Err(StatusError::Api(e)),
    }
}

/// Status after a successful backup completed at `completed_at` (RFC3339)
#[must_use]
pub fn completed_status(
    current: &DatabaseBackup,
    report: &BackupReport,
    completed_at: &str,
) -> DatabaseBackupStatus {
    DatabaseBackupStatus {
        phase: BackupPhase::Completed,
        last_backup_time: Some(completed_at.to_string()),
        last_error: None,
        last_backup_file: Some(report.path.display().to_string()),
        keys_backed_up: Some(i64::try_from(report.written).unwrap_or(i64::MAX)),
        observed_generation: current.metadata.generation,
    }
}

/// Status after a failed reconciliation; the record of the last good backup is kept
#[must_use]
pub fn failed_status(current: &DatabaseBackup, error: &str) -> DatabaseBackupStatus {
    let previous = current.status.clone().unwrap_or_default();
    DatabaseBackupStatus {
        phase: BackupPhase::Failed,
        last_error: Some(error.to_string()),
        observed_generation: current.metadata.generation,
        ..previous
    }
}
