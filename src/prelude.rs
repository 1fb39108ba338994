//! # Prelude
//!
//! Re-exports commonly used types and traits.
//!
//! ```rust
//! use database_backup_controller::prelude::*;
//! ```

// CRD types
pub use crate::crd::*;

// Control loop
pub use crate::controller::feed::{ChangeFeed, FeedEvent};
pub use crate::controller::key::ResourceKey;
pub use crate::controller::queue::WorkQueue;
pub use crate::controller::worker::{spawn_workers, Action, Reconcile};

// Reconcilers and their seams
pub use crate::controller::api::{ApiError, BackupApi, PodApi};
pub use crate::controller::drivers::{DriverError, KeyValueConnector, KeyValueStore};
pub use crate::controller::labeler::PodLabeler;
pub use crate::controller::reconciler::{BackupReconciler, ReconcilerError};

// Config types
pub use crate::config::{ControllerConfig, LogFormat, ServerConfig};
