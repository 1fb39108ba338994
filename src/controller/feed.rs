//! # Change Feed
//!
//! Turns a Kubernetes watch into normalized `Added`/`Modified`/`Deleted`
//! events and feeds the selected ones into a work queue.
//!
//! The watch starts with a full listing. If the listing fails before the first
//! sync completes the feed returns an error (nothing downstream can trust a
//! partial view). After that, any stream error drops the watch and a new one is
//! started, which re-lists and re-delivers every existing object as `Added`.
//!
//! Updates that leave `metadata.generation` unchanged (status writes, label or
//! annotation edits) are dropped, so a reconciler's own status patch does not
//! trigger another reconciliation.

use crate::controller::key::ResourceKey;
use crate::controller::queue::WorkQueue;
use crate::observability::metrics;
use crate::runtime::shutdown::wait_for_shutdown;
use futures::{Stream, StreamExt};
use kube::api::Api;
use kube::Resource;
use kube_runtime::watcher;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("initial listing failed: {0}")]
    InitialList(#[source] watcher::Error),
}

/// Normalized change notification
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent<K> {
    Added(K),
    Modified(K),
    Deleted(K),
}

impl<K> FeedEvent<K> {
    pub fn object(&self) -> &K {
        match self {
            FeedEvent::Added(obj) | FeedEvent::Modified(obj) | FeedEvent::Deleted(obj) => obj,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            FeedEvent::Added(_) => "added",
            FeedEvent::Modified(_) => "modified",
            FeedEvent::Deleted(_) => "deleted",
        }
    }
}

/// Converts raw watcher events into `FeedEvent`s
///
/// Every object delivered by a (re)list is `Added`. Outside a listing an apply
/// is `Added` when the key is new and `Modified` when its generation moved.
/// An apply for a known key with the same generation yields nothing. Objects
/// without a generation are always `Modified`.
#[derive(Debug, Default)]
pub struct EventNormalizer {
    /// Last seen `metadata.generation` per key
    known: HashMap<ResourceKey, Option<i64>>,
    listing: HashMap<ResourceKey, Option<i64>>,
    synced: bool,
}

impl EventNormalizer {
    pub fn normalize<K: Resource>(&mut self, event: watcher::Event<K>) -> Option<FeedEvent<K>> {
        match event {
            watcher::Event::Init => {
                self.listing.clear();
                None
            }
            watcher::Event::InitApply(obj) => {
                let key = keyed(&obj)?;
                self.listing.insert(key, obj.meta().generation);
                Some(FeedEvent::Added(obj))
            }
            watcher::Event::InitDone => {
                self.known = std::mem::take(&mut self.listing);
                self.synced = true;
                None
            }
            watcher::Event::Apply(obj) => {
                let key = keyed(&obj)?;
                let generation = obj.meta().generation;
                match self.known.insert(key.clone(), generation) {
                    None => Some(FeedEvent::Added(obj)),
                    Some(seen) if generation.is_some() && seen == generation => {
                        debug!(key = %key, "Generation unchanged, ignoring update");
                        None
                    }
                    Some(_) => Some(FeedEvent::Modified(obj)),
                }
            }
            watcher::Event::Delete(obj) => {
                let key = keyed(&obj)?;
                self.known.remove(&key);
                Some(FeedEvent::Deleted(obj))
            }
        }
    }

    /// Whether a full listing has completed
    pub fn is_synced(&self) -> bool {
        self.synced
    }
}

fn keyed<K: Resource>(obj: &K) -> Option<ResourceKey> {
    let key = ResourceKey::from_resource(obj);
    if key.is_none() {
        warn!("Ignoring watch event for an object without a name");
    }
    key
}

/// Watch-backed change feed for one resource type
pub struct ChangeFeed<K: Resource> {
    api: Api<K>,
    watcher_config: watcher::Config,
    restart_delay: Duration,
    synced: Arc<AtomicBool>,
}

impl<K: Resource> std::fmt::Debug for ChangeFeed<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("restart_delay", &self.restart_delay)
            .field("synced", &self.synced.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<K> ChangeFeed<K>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    pub fn new(api: Api<K>, watcher_config: watcher::Config, restart_delay: Duration) -> Self {
        Self {
            api,
            watcher_config,
            restart_delay,
            synced: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag set once the first full listing has been delivered
    pub fn synced_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.synced)
    }

    /// Run the feed until shutdown, enqueueing the key of every selected event
    pub async fn run<F>(
        self,
        queue: Arc<WorkQueue<ResourceKey>>,
        select: F,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), FeedError>
    where
        F: Fn(&FeedEvent<K>) -> bool + Send,
    {
        loop {
            info!("Starting watch (full listing)");
            let stream = watcher(self.api.clone(), self.watcher_config.clone());
            match drain(stream, &queue, &select, &self.synced, &mut shutdown).await {
                Ok(StreamEnd::Shutdown) => {
                    info!("Shutdown requested, stopping change feed");
                    return Ok(());
                }
                Ok(StreamEnd::Relist) => {}
                Err(e) => return Err(FeedError::InitialList(e)),
            }

            metrics::increment_watch_restarts();
            tokio::select! {
                () = wait_for_shutdown(&mut shutdown) => return Ok(()),
                () = tokio::time::sleep(self.restart_delay) => {}
            }
        }
    }
}

/// Why a single watch stream stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamEnd {
    Shutdown,
    /// Stream failed or ended after the first sync; start a new watch
    Relist,
}

/// Consume one watch stream, dispatching events until it ends
///
/// An error before `synced` has ever been set is returned as fatal. `synced`
/// is set once the first full listing of this or any earlier stream completed.
async fn drain<K, S, E, F>(
    stream: S,
    queue: &WorkQueue<ResourceKey>,
    select: &F,
    synced: &AtomicBool,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<StreamEnd, E>
where
    K: Resource,
    S: Stream<Item = Result<watcher::Event<K>, E>>,
    E: Display,
    F: Fn(&FeedEvent<K>) -> bool,
{
    let mut stream = std::pin::pin!(stream);
    let mut normalizer = EventNormalizer::default();

    loop {
        let item = tokio::select! {
            () = wait_for_shutdown(shutdown) => return Ok(StreamEnd::Shutdown),
            item = stream.next() => item,
        };

        match item {
            Some(Ok(event)) => {
                if let Some(feed_event) = normalizer.normalize(event) {
                    dispatch(queue, select, &feed_event);
                }
                if normalizer.is_synced() && !synced.swap(true, Ordering::Relaxed) {
                    info!("Initial listing complete, watching for changes");
                }
            }
            Some(Err(e)) => {
                if !synced.load(Ordering::Relaxed) {
                    return Err(e);
                }
                warn!("Watch stream error, will re-list: {}", e);
                return Ok(StreamEnd::Relist);
            }
            None => {
                warn!("Watch stream ended, will re-list");
                return Ok(StreamEnd::Relist);
            }
        }
    }
}

fn dispatch<K, F>(queue: &WorkQueue<ResourceKey>, select: &F, event: &FeedEvent<K>)
where
    K: Resource,
    F: Fn(&FeedEvent<K>) -> bool,
{
    metrics::increment_feed_events(event.kind());
    if !select(event) {
        return;
    }
    if let Some(key) = ResourceKey::from_resource(event.object()) {
        debug!(key = %key, event = event.kind(), "Enqueueing");
        queue.add(key);
        metrics::set_queue_depth(queue.len());
    }
}
