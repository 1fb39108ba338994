//! # Metrics
//!
//! Prometheus metrics for monitoring the controllers.
//!
//! ## Metrics Exposed
//!
//! - `dbbackup_reconciliations_total` - Total number of reconciliations
//! - `dbbackup_reconciliation_errors_total` - Reconciliation errors by reason
//! - `dbbackup_reconciliation_duration_seconds` - Duration of reconciliations
//! - `dbbackup_requeues_total` - Requeues by reason
//! - `dbbackup_backups_written_total` - Backup files written
//! - `dbbackup_keys_backed_up_total` - Keys written into backup files
//! - `dbbackup_key_read_failures_total` - Keys skipped because the read failed
//! - `dbbackup_status_conflicts_total` - Optimistic-concurrency conflicts on status writes
//! - `dbbackup_queue_depth` - Keys waiting in the work queue
//! - `dbbackup_feed_events_total` - Change feed events by kind
//! - `dbbackup_watch_restarts_total` - Watch re-lists after a disconnect
//! - `dbbackup_pods_labeled_total` - Pods patched by the labeler
//! - `dbbackup_label_patches_skipped_total` - Pods already carrying the label

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, IntGauge, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "dbbackup_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "dbbackup_reconciliation_errors_total",
            "Total number of reconciliation errors by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "dbbackup_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new("dbbackup_requeues_total", "Total number of requeues by reason"),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

static BACKUPS_WRITTEN_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "dbbackup_backups_written_total",
        "Total number of backup files written",
    )
    .expect("Failed to create BACKUPS_WRITTEN_TOTAL metric - this should never happen")
});

static KEYS_BACKED_UP_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "dbbackup_keys_backed_up_total",
        "Total number of keys written into backup files",
    )
    .expect("Failed to create KEYS_BACKED_UP_TOTAL metric - this should never happen")
});

static KEY_READ_FAILURES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "dbbackup_key_read_failures_total",
        "Total number of keys skipped because reading the value failed",
    )
    .expect("Failed to create KEY_READ_FAILURES_TOTAL metric - this should never happen")
});

static STATUS_CONFLICTS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "dbbackup_status_conflicts_total",
        "Total number of status writes rejected with a conflict",
    )
    .expect("Failed to create STATUS_CONFLICTS_TOTAL metric - this should never happen")
});

static QUEUE_DEPTH: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new("dbbackup_queue_depth", "Keys waiting in the work queue")
        .expect("Failed to create QUEUE_DEPTH metric - this should never happen")
});

static FEED_EVENTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "dbbackup_feed_events_total",
            "Total number of change feed events by kind",
        ),
        &["kind"],
    )
    .expect("Failed to create FEED_EVENTS_TOTAL metric - this should never happen")
});

static WATCH_RESTARTS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "dbbackup_watch_restarts_total",
        "Total number of watch restarts after a disconnect",
    )
    .expect("Failed to create WATCH_RESTARTS_TOTAL metric - this should never happen")
});

static PODS_LABELED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "dbbackup_pods_labeled_total",
        "Total number of Pods patched with the managed-by label",
    )
    .expect("Failed to create PODS_LABELED_TOTAL metric - this should never happen")
});

static LABEL_PATCHES_SKIPPED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "dbbackup_label_patches_skipped_total",
        "Total number of label patches skipped because the label was already present",
    )
    .expect("Failed to create LABEL_PATCHES_SKIPPED_TOTAL metric - this should never happen")
});

pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(BACKUPS_WRITTEN_TOTAL.clone()))?;
    REGISTRY.register(Box::new(KEYS_BACKED_UP_TOTAL.clone()))?;
    REGISTRY.register(Box::new(KEY_READ_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STATUS_CONFLICTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(QUEUE_DEPTH.clone()))?;
    REGISTRY.register(Box::new(FEED_EVENTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(WATCH_RESTARTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PODS_LABELED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(LABEL_PATCHES_SKIPPED_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors(reason: &str) {
    RECONCILIATION_ERRORS_TOTAL.with_label_values(&[reason]).inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

pub fn record_backup_written(keys: u64) {
    BACKUPS_WRITTEN_TOTAL.inc();
    KEYS_BACKED_UP_TOTAL.inc_by(keys);
}

pub fn increment_key_read_failures() {
    KEY_READ_FAILURES_TOTAL.inc();
}

pub fn increment_status_conflicts() {
    STATUS_CONFLICTS_TOTAL.inc();
}

pub fn set_queue_depth(depth: usize) {
    QUEUE_DEPTH.set(i64::try_from(depth).unwrap_or(i64::MAX));
}

pub fn increment_feed_events(kind: &str) {
    FEED_EVENTS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_watch_restarts() {
    WATCH_RESTARTS_TOTAL.inc();
}

pub fn increment_pods_labeled() {
    PODS_LABELED_TOTAL.inc();
}

pub fn increment_label_patches_skipped() {
    LABEL_PATCHES_SKIPPED_TOTAL.inc();
}
