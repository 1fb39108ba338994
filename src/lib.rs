//! DatabaseBackup Controller Library
//!
//! Building blocks for the `database-backup-controller` and `pod-labeler`
//! binaries: the `DatabaseBackup` CRD, a change feed over Kubernetes watches,
//! a deduplicating work queue, a worker pool, and the two reconcilers.
//!
//! ## Quick Start
//!
//! ```rust
//! use database_backup_controller::prelude::*;
//! ```

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod runtime;
pub mod server;
