//! # Controller
//!
//! Control-loop building blocks shared by both controllers, and the two
//! reconcilers built on them.
//!
//! - `feed`: watch-backed change feed with event normalization
//! - `queue`: deduplicating, delay-aware work queue
//! - `worker`: fixed worker pool and the `Reconcile` trait
//! - `backoff`: Fibonacci backoff for failed keys
//! - `api`: narrow Kubernetes API traits used by the reconcilers
//! - `drivers`: external side effects (backup dump, label patch)
//! - `reconciler`: level-triggered `DatabaseBackup` reconciler
//! - `labeler`: edge-triggered Pod labeler

pub mod api;
pub mod backoff;
pub mod drivers;
pub mod feed;
pub mod key;
pub mod labeler;
pub mod queue;
pub mod reconciler;
pub mod worker;
