//! # Worker Pool
//!
//! Fixed set of workers draining a `WorkQueue`. Each key is reconciled by at
//! most one worker at a time; distinct keys proceed in parallel.

use crate::controller::key::ResourceKey;
use crate::controller::queue::WorkQueue;
use crate::observability::metrics;
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// What the worker should do with a key after reconciling it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Reconcile again after the given delay
    Requeue(Duration),
    /// Nothing further until a new event arrives
    AwaitChange,
}

/// A reconciler driven by the worker pool
#[async_trait]
pub trait Reconcile: Send + Sync + 'static {
    /// Reconcile one key. Errors are handled inside and expressed as an `Action`.
    async fn reconcile(&self, key: &ResourceKey) -> Action;

    /// Delay used when `reconcile` panics
    fn panic_requeue(&self) -> Duration;
}

/// Spawn `workers` tasks that run until the queue shuts down
///
/// The returned set completes once every in-flight reconciliation has finished.
pub fn spawn_workers<R: Reconcile>(
    queue: &Arc<WorkQueue<ResourceKey>>,
    reconciler: &Arc<R>,
    workers: usize,
) -> JoinSet<()> {
    let mut set = JoinSet::new();
    for id in 0..workers.max(1) {
        set.spawn(run_worker(id, Arc::clone(queue), Arc::clone(reconciler)));
    }
    info!("Started {} reconcile workers", workers.max(1));
    set
}

async fn run_worker<R: Reconcile>(id: usize, queue: Arc<WorkQueue<ResourceKey>>, reconciler: Arc<R>) {
    while let Some(key) = queue.next().await {
        metrics::set_queue_depth(queue.len());
        debug!(worker = id, key = %key, "Picked up key");

        let action = match AssertUnwindSafe(reconciler.reconcile(&key))
            .catch_unwind()
            .await
        {
            Ok(action) => action,
            Err(_) => {
                error!(worker = id, key = %key, "Reconciliation panicked");
                metrics::increment_reconciliation_errors("panic");
                Action::Requeue(reconciler.panic_requeue())
            }
        };

        queue.done(&key);
        if let Action::Requeue(delay) = action {
            queue.add_after(key, delay);
        }
        metrics::set_queue_depth(queue.len());
    }
    debug!(worker = id, "Queue shut down, worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Reconcile for Counting {
        async fn reconcile(&self, key: &ResourceKey) -> Action {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(key.name != "boom", "boom");
            if n == 0 {
                Action::Requeue(Duration::from_secs(1))
            } else {
                Action::AwaitChange
            }
        }

        fn panic_requeue(&self) -> Duration {
            Duration::from_secs(3600)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_requeue_action_reinserts_key() {
        let queue = Arc::new(WorkQueue::new());
        let reconciler = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let mut workers = spawn_workers(&queue, &reconciler, 2);

        queue.add(ResourceKey::new("default", "a"));
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(reconciler.calls.load(Ordering::SeqCst), 2);
        assert!(queue.is_empty());

        queue.shut_down();
        while workers.join_next().await.is_some() {}
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_reconcile_does_not_kill_worker() {
        let queue = Arc::new(WorkQueue::new());
        let reconciler = Arc::new(Counting {
            calls: AtomicUsize::new(1),
        });
        let mut workers = spawn_workers(&queue, &reconciler, 1);

        queue.add(ResourceKey::new("default", "boom"));
        queue.add(ResourceKey::new("default", "fine"));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(reconciler.calls.load(Ordering::SeqCst), 3);
        // The panicked key is requeued with the panic delay
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.in_flight(), 0);

        queue.shut_down();
        while workers.join_next().await.is_some() {}
    }
}
