//! # Reconciler
//!
//! Level-triggered reconciliation of `DatabaseBackup` resources.
//!
//! ## Reconciliation Flow
//!
//! 1. Fetch the resource (deleted resources are dropped)
//! 2. Validate settings and apply defaults
//! 3. Resolve the data-store password from the connection Secret
//! 4. Dump every key to a new backup file
//! 5. Write status (`Completed` or `Failed`)
//! 6. Requeue after `backupInterval`, or after the failure backoff

pub mod credentials;
pub mod duration;
pub mod reconcile;
pub mod settings;
pub mod status;
pub mod types;

pub use reconcile::BackupReconciler;
pub use types::ReconcilerError;
