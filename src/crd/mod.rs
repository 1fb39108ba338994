//! # Custom Resource Definitions
//!
//! CRD types for the database backup controller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - `DatabaseBackup` specification and default values
//! - `status.rs` - Observed state written through the status subresource

mod spec;
mod status;

pub use spec::{
    default_backup_directory, default_backup_interval, default_redis_addr, DatabaseBackup,
    DatabaseBackupSpec,
};
pub use status::{BackupPhase, DatabaseBackupStatus};
