//! # Backup Reconciliation
//!
//! Per key: fetch, validate settings, resolve credentials, dump the store,
//! write status, schedule the next run.
//!
//! - Deleted resource: dropped, nothing written.
//! - Configuration error: `Failed` status, no requeue until the resource changes.
//! - Any other failure: `Failed` status, requeued after the per-key backoff.
//! - Success: `Completed` status, backoff reset, requeued after `backupInterval`.

use crate::config::ControllerConfig;
use crate::controller::api::{ApiError, BackupApi};
use crate::controller::backoff::KeyedBackoff;
use crate::controller::drivers::{BackupReport, DumpDriver, KeyValueConnector};
use crate::controller::key::ResourceKey;
use crate::controller::reconciler::credentials::resolve_password;
use crate::controller::reconciler::settings::BackupSettings;
use crate::controller::reconciler::status::{
    completed_status, failed_status, write_status, StatusError,
};
use crate::controller::reconciler::types::ReconcilerError;
use crate::controller::worker::{Action, Reconcile};
use crate::crd::DatabaseBackup;
use crate::observability::metrics;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn, Instrument};

#[derive(Debug)]
pub struct BackupReconciler<A, C> {
    api: A,
    dumper: DumpDriver<C>,
    backoff: KeyedBackoff,
}

impl<A: BackupApi, C: KeyValueConnector> BackupReconciler<A, C> {
    pub fn new(api: A, connector: C, config: &ControllerConfig) -> Self {
        Self {
            api,
            dumper: DumpDriver::new(connector),
            backoff: KeyedBackoff::new(
                Duration::from_secs(config.error_requeue_min_secs),
                Duration::from_secs(config.error_requeue_max_secs),
            ),
        }
    }

    /// Consecutive failures recorded for `key`
    pub fn error_count(&self, key: &ResourceKey) -> u32 {
        self.backoff.error_count(key)
    }

    async fn reconcile_key(&self, key: &ResourceKey) -> Action {
        let backup = match self.api.get(key).await {
            Ok(backup) => backup,
            Err(ApiError::NotFound) => {
                debug!("Resource no longer exists, dropping key");
                self.backoff.forget(key);
                return Action::AwaitChange;
            }
            Err(e) => return self.fail(key, &ReconcilerError::Fetch(e)),
        };

        let outcome = self.take_backup(key, &backup).await;

        let written = match &outcome {
            Ok((report, _)) => {
                let completed_at = chrono::Utc::now().to_rfc3339();
                write_status(&self.api, key, &backup, |current| {
                    completed_status(current, report, &completed_at)
                })
                .await
            }
            Err(e) => {
                let message = e.to_string();
                write_status(&self.api, key, &backup, |current| {
                    failed_status(current, &message)
                })
                .await
            }
        };

        match (outcome, written) {
            (_, Err(StatusError::Gone)) => {
                debug!("Resource deleted during reconciliation, dropping key");
                self.backoff.forget(key);
                Action::AwaitChange
            }
            (outcome, Err(status_error)) => {
                if let Err(e) = outcome {
                    warn!(stage = e.reason(), "Reconciliation failed: {}", e);
                }
                self.fail(key, &ReconcilerError::Status(status_error))
            }
            (Ok((report, interval)), Ok(())) => {
                self.backoff.forget(key);
                metrics::increment_requeues_total("interval");
                info!(
                    file = %report.path.display(),
                    keys = report.written,
                    "Backup completed, next run in {:?}",
                    interval
                );
                Action::Requeue(interval)
            }
            (Err(e), Ok(())) => self.fail(key, &e),
        }
    }

    async fn take_backup(
        &self,
        key: &ResourceKey,
        backup: &DatabaseBackup,
    ) -> Result<(BackupReport, Duration), ReconcilerError> {
        let settings = BackupSettings::from_spec(&backup.spec)?;
        debug!(
            database = %settings.database_name,
            address = %settings.address,
            directory = %settings.directory.display(),
            "Starting backup"
        );

        let password =
            resolve_password(&self.api, &key.namespace, &settings.connection_secret).await?;
        let report = self
            .dumper
            .run(&settings.address, &password, &settings.directory)
            .await?;
        metrics::record_backup_written(u64::try_from(report.written).unwrap_or(u64::MAX));

        Ok((report, settings.interval))
    }

    fn fail(&self, key: &ResourceKey, error: &ReconcilerError) -> Action {
        metrics::increment_reconciliation_errors(error.reason());
        if error.is_configuration() {
            warn!(
                stage = error.reason(),
                "Reconciliation failed, waiting for the resource to change: {}", error
            );
            return Action::AwaitChange;
        }

        let (delay, attempts) = self.backoff.record_failure(key);
        error!(
            stage = error.reason(),
            attempts,
            "Reconciliation failed, retrying in {:?}: {}",
            delay,
            error
        );
        metrics::increment_requeues_total("error_backoff");
        Action::Requeue(delay)
    }
}

#[async_trait]
impl<A: BackupApi, C: KeyValueConnector> Reconcile for BackupReconciler<A, C> {
    async fn reconcile(&self, key: &ResourceKey) -> Action {
        let span = info_span!("reconcile", namespace = %key.namespace, name = %key.name);
        async {
            metrics::increment_reconciliations();
            let started = Instant::now();
            let action = self.reconcile_key(key).await;
            metrics::observe_reconciliation_duration(started.elapsed().as_secs_f64());
            action
        }
        .instrument(span)
        .await
    }

    fn panic_requeue(&self) -> Duration {
        self.backoff.max()
    }
}
