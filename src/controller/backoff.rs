//! # Fibonacci Backoff
//!
//! Provides a Fibonacci-based backoff for requeueing failed reconciliations.
//! It grows more slowly than exponential backoff, so a flapping data store is
//! retried often without hammering it.
//!
//! Sequence with a 5s start and 60s cap: 5s, 5s, 10s, 15s, 25s, 40s, 60s (max).
//!
//! ## Usage
//!
//! ```rust
//! use database_backup_controller::controller::backoff::FibonacciBackoff;
//! use std::time::Duration;
//!
//! let mut backoff = FibonacciBackoff::new(Duration::from_secs(5), Duration::from_secs(60));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(5));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(5));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(10));
//! ```

use crate::controller::key::ResourceKey;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Fibonacci backoff calculator
///
/// Each backoff is the sum of the previous two, capped at `max`.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    /// Minimum backoff value (for reset)
    min_secs: u64,
    /// Previous backoff value
    prev_secs: u64,
    /// Current backoff value
    current_secs: u64,
    /// Maximum backoff value
    max_secs: u64,
}

impl FibonacciBackoff {
    /// Create a new Fibonacci backoff with specified minimum and maximum values
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        let min_secs = min.as_secs().max(1);
        Self {
            min_secs,
            prev_secs: 0,
            current_secs: min_secs,
            max_secs: max.as_secs().max(min_secs),
        }
    }

    /// Get the next backoff duration and advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let result = self.current_secs;

        let next = self.prev_secs.saturating_add(self.current_secs);
        self.prev_secs = self.current_secs;
        self.current_secs = next.min(self.max_secs);

        Duration::from_secs(result)
    }

    /// Reset the backoff to the initial state
    pub fn reset(&mut self) {
        self.prev_secs = 0;
        self.current_secs = self.min_secs;
    }
}

/// Backoff state for a specific resource
/// Tracks error count and backoff calculator for progressive retries
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

/// Per-key failure backoff, shared by all workers of one controller
///
/// Keys never reconcile concurrently, so entries are only contended across keys.
#[derive(Debug)]
pub struct KeyedBackoff {
    min: Duration,
    max: Duration,
    states: Mutex<HashMap<ResourceKey, BackoffState>>,
}

impl KeyedBackoff {
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Record a failure for `key` and return the delay before the next attempt
    /// along with the consecutive error count
    pub fn record_failure(&self, key: &ResourceKey) -> (Duration, u32) {
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        let state = states.entry(key.clone()).or_insert_with(|| BackoffState {
            backoff: FibonacciBackoff::new(self.min, self.max),
            error_count: 0,
        });
        state.error_count = state.error_count.saturating_add(1);
        (state.backoff.next_backoff(), state.error_count)
    }

    /// Forget the failure history of `key` (after a success or deletion)
    pub fn forget(&self, key: &ResourceKey) {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Ceiling of the backoff sequence
    #[must_use]
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Consecutive failures recorded for `key`
    pub fn error_count(&self, key: &ResourceKey) -> u32 {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map_or(0, |s| s.error_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_fibonacci_backoff_sequence() {
        let mut backoff = FibonacciBackoff::new(secs(5), secs(60));

        assert_eq!(backoff.next_backoff(), secs(5));
        assert_eq!(backoff.next_backoff(), secs(5));
        assert_eq!(backoff.next_backoff(), secs(10));
        assert_eq!(backoff.next_backoff(), secs(15));
        assert_eq!(backoff.next_backoff(), secs(25));
        assert_eq!(backoff.next_backoff(), secs(40));
        assert_eq!(backoff.next_backoff(), secs(60));
        // Next would be 65s, capped at 60s
        assert_eq!(backoff.next_backoff(), secs(60));
    }

    #[test]
    fn test_fibonacci_backoff_reset() {
        let mut backoff = FibonacciBackoff::new(secs(5), secs(60));
        backoff.next_backoff();
        backoff.next_backoff();
        backoff.next_backoff();

        backoff.reset();

        assert_eq!(backoff.next_backoff(), secs(5));
        assert_eq!(backoff.next_backoff(), secs(5));
        assert_eq!(backoff.next_backoff(), secs(10));
    }

    #[test]
    fn test_zero_minimum_is_clamped() {
        let mut backoff = FibonacciBackoff::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(backoff.next_backoff(), secs(1));
        assert_eq!(backoff.next_backoff(), secs(1));
    }

    #[test]
    fn test_keyed_backoff_is_per_resource() {
        let backoff = KeyedBackoff::new(secs(5), secs(60));
        let a = ResourceKey::new("default", "a");
        let b = ResourceKey::new("default", "b");

        assert_eq!(backoff.record_failure(&a), (secs(5), 1));
        assert_eq!(backoff.record_failure(&a), (secs(5), 2));
        assert_eq!(backoff.record_failure(&a), (secs(10), 3));

        // Second resource starts fresh
        assert_eq!(backoff.record_failure(&b), (secs(5), 1));

        backoff.forget(&a);
        assert_eq!(backoff.error_count(&a), 0);
        assert_eq!(backoff.record_failure(&a), (secs(5), 1));
        assert_eq!(backoff.error_count(&b), 1);
    }
}
