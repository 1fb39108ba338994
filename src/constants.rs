//! # Constants
//!
//! Shared constants used throughout the controllers.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default number of reconcile workers pulling from the work queue
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// First delay of the per-key failure backoff (seconds)
pub const DEFAULT_ERROR_REQUEUE_MIN_SECS: u64 = 5;

/// Ceiling of the per-key failure backoff (seconds)
pub const DEFAULT_ERROR_REQUEUE_MAX_SECS: u64 = 60;

/// Delay before re-establishing a watch after the feed disconnects (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Timeout for establishing a data-store connection (seconds)
pub const DEFAULT_DATASTORE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default backup interval when `backupInterval` is unset
pub const DEFAULT_BACKUP_INTERVAL: &str = "5m";

/// Shortest accepted `backupInterval` (seconds)
pub const MIN_BACKUP_INTERVAL_SECS: u64 = 1;

/// Default backup directory when `backupDirectory` is unset
pub const DEFAULT_BACKUP_DIRECTORY: &str = "/tmp/db_backups";

/// Default data-store address when `redisAddr` is unset
pub const DEFAULT_REDIS_ADDR: &str = "localhost:6379";

/// Database type handled by the dump driver
pub const SUPPORTED_DATABASE_TYPE: &str = "redis";

/// Storage type the dump driver writes to; other values are accepted with a warning
pub const SUPPORTED_STORAGE_TYPE: &str = "local";

/// Keys looked up (in order) in the connection secret
pub const PASSWORD_SECRET_KEYS: [&str; 2] = ["password", "redis-password"];

/// Annotation that opts a Pod into automatic labelling
pub const AUTO_LABEL_ANNOTATION: &str = "auto-label";

/// Value the opt-in annotation must carry
pub const AUTO_LABEL_ANNOTATION_VALUE: &str = "true";

/// Label applied by the Pod labeler
pub const MANAGED_BY_LABEL: &str = "managed-by";

/// Value of the label applied by the Pod labeler
pub const MANAGED_BY_VALUE: &str = "custom-controller";

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "database_backup_controller=info";
