//! # Work Queue
//!
//! Deduplicating, delay-aware queue keyed by resource identity.
//!
//! - `add_after` keeps only the soonest eligible time per key.
//! - `next` hands a key to exactly one worker; the key stays in flight until
//!   `done` is called.
//! - Adds for an in-flight key are parked and moved back into the queue,
//!   with their original eligible time, when the key is marked done.
//!
//! All state sits behind a single mutex that is never held across an await.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

#[derive(Debug)]
struct QueueState<K> {
    /// Keys waiting for a worker, with their earliest eligible time
    queued: HashMap<K, Instant>,
    /// Keys currently handed out to a worker
    in_flight: HashSet<K>,
    /// Adds received while the key was in flight
    parked: HashMap<K, Instant>,
    shutting_down: bool,
}

impl<K: Clone + Eq + Hash> QueueState<K> {
    fn earliest(&self) -> Option<(K, Instant)> {
        self.queued
            .iter()
            .min_by_key(|(_, at)| **at)
            .map(|(key, at)| (key.clone(), *at))
    }
}

fn keep_soonest<K: Eq + Hash>(map: &mut HashMap<K, Instant>, key: K, at: Instant) {
    map.entry(key)
        .and_modify(|existing| {
            if at < *existing {
                *existing = at;
            }
        })
        .or_insert(at);
}

#[derive(Debug)]
pub struct WorkQueue<K> {
    state: Mutex<QueueState<K>>,
    notify: Notify,
}

impl<K: Clone + Eq + Hash> Default for WorkQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Eq + Hash> WorkQueue<K> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                queued: HashMap::new(),
                in_flight: HashSet::new(),
                parked: HashMap::new(),
                shutting_down: false,
            }),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<K>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue `key` for immediate processing
    pub fn add(&self, key: K) {
        self.add_after(key, Duration::ZERO);
    }

    /// Enqueue `key` to become eligible after `delay`
    ///
    /// If the key is already queued the sooner of the two times wins.
    /// Ignored once the queue is shutting down.
    pub fn add_after(&self, key: K, delay: Duration) {
        let at = Instant::now() + delay;
        {
            let mut state = self.lock();
            if state.shutting_down {
                return;
            }
            if state.in_flight.contains(&key) {
                keep_soonest(&mut state.parked, key, at);
            } else {
                keep_soonest(&mut state.queued, key, at);
            }
        }
        self.notify.notify_waiters();
    }

    /// Wait for the next eligible key and mark it in flight
    ///
    /// Returns `None` once the queue is shut down.
    pub async fn next(&self) -> Option<K> {
        loop {
            // Registered before inspecting state so a concurrent add is not missed
            let notified = self.notify.notified();

            let wake_at = {
                let mut state = self.lock();
                if state.shutting_down {
                    return None;
                }
                match state.earliest() {
                    Some((key, at)) if at <= Instant::now() => {
                        state.queued.remove(&key);
                        state.in_flight.insert(key.clone());
                        return Some(key);
                    }
                    Some((_, at)) => Some(at),
                    None => None,
                }
            };

            match wake_at {
                Some(at) => {
                    tokio::select! {
                        () = notified => {}
                        () = tokio::time::sleep_until(at) => {}
                    }
                }
                None => notified.await,
            }
        }
    }

    /// Mark `key` as finished, releasing any add parked while it was in flight
    pub fn done(&self, key: &K) {
        {
            let mut state = self.lock();
            state.in_flight.remove(key);
            if let Some(at) = state.parked.remove(key) {
                if !state.shutting_down {
                    keep_soonest(&mut state.queued, key.clone(), at);
                }
            }
        }
        self.notify.notify_waiters();
    }

    /// Number of keys waiting (queued or parked behind an in-flight run)
    pub fn len(&self) -> usize {
        let state = self.lock();
        state.queued.len() + state.parked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of keys currently handed out to workers
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.len()
    }

    /// Stop handing out keys; pending keys are discarded and later adds ignored
    pub fn shut_down(&self) {
        {
            let mut state = self.lock();
            state.shutting_down = true;
            state.queued.clear();
            state.parked.clear();
        }
        self.notify.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.lock().shutting_down
    }
}
