//! # Types
//!
//! Error taxonomy of the backup reconciler.

use crate::controller::api::ApiError;
use crate::controller::drivers::DriverError;
use crate::controller::reconciler::credentials::CredentialError;
use crate::controller::reconciler::settings::SettingsError;
use crate::controller::reconciler::status::StatusError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    /// The desired state is unusable as written
    #[error("invalid configuration: {0}")]
    Configuration(#[from] SettingsError),
    #[error("credentials unavailable: {0}")]
    Credentials(#[from] CredentialError),
    #[error("backup failed: {0}")]
    Backup(#[from] DriverError),
    #[error("{0}")]
    Status(#[from] StatusError),
    #[error("reading resource failed: {0}")]
    Fetch(ApiError),
}

impl ReconcilerError {
    /// Metric label and log field for the failing stage
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            ReconcilerError::Configuration(_) => "configuration",
            ReconcilerError::Credentials(_) => "credentials",
            ReconcilerError::Backup(_) => "backup",
            ReconcilerError::Status(StatusError::Conflict) => "status_conflict",
            ReconcilerError::Status(_) => "status",
            ReconcilerError::Fetch(_) => "fetch",
        }
    }

    /// Configuration errors are not retried until the resource changes
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, ReconcilerError::Configuration(_))
    }
}
