//! # DatabaseBackup Status
//!
//! Observed state, written only by the controller through the status subresource.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of a backup resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, schemars::JsonSchema)]
pub enum BackupPhase {
    /// Not reconciled yet
    #[default]
    Pending,
    /// A backup is being taken
    Running,
    /// The last backup succeeded
    Completed,
    /// The last reconciliation failed; see `lastError`
    Failed,
}

impl BackupPhase {
    /// External string form, as stored in `status.phase`
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupPhase::Pending => "Pending",
            BackupPhase::Running => "Running",
            BackupPhase::Completed => "Completed",
            BackupPhase::Failed => "Failed",
        }
    }
}

impl fmt::Display for BackupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of the DatabaseBackup resource
///
/// `None` fields serialize as `null` so a merge patch clears them.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseBackupStatus {
    /// Current phase: Pending, Running, Completed, Failed
    #[serde(default)]
    pub phase: BackupPhase,
    /// Completion time of the last successful backup (RFC3339)
    #[serde(default)]
    pub last_backup_time: Option<String>,
    /// Error reported by the last failed reconciliation
    #[serde(default)]
    pub last_error: Option<String>,
    /// Path of the last backup file written
    #[serde(default)]
    pub last_backup_file: Option<String>,
    /// Number of keys written by the last backup
    #[serde(default)]
    pub keys_backed_up: Option<i64>,
    /// Generation of the spec observed by the last reconciliation
    #[serde(default)]
    pub observed_generation: Option<i64>,
}
