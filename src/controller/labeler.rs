//! # Pod Labeler
//!
//! Edge-triggered: only `Added` Pods carrying `auto-label: "true"` reach the
//! queue. Each one is labelled `managed-by=custom-controller` once; a
//! redelivered event (e.g. after a re-list) finds the label and skips the patch.

use crate::config::ControllerConfig;
use crate::constants::{AUTO_LABEL_ANNOTATION, AUTO_LABEL_ANNOTATION_VALUE};
use crate::controller::api::PodApi;
use crate::controller::backoff::KeyedBackoff;
use crate::controller::drivers::{LabelDriver, PatchResult};
use crate::controller::feed::FeedEvent;
use crate::controller::key::ResourceKey;
use crate::controller::worker::{Action, Reconcile};
use crate::observability::metrics;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn, Instrument};

/// Feed filter: creation events of opted-in Pods
pub fn wants_label(event: &FeedEvent<Pod>) -> bool {
    let FeedEvent::Added(pod) = event else {
        return false;
    };
    pod.metadata
        .annotations
        .as_ref()
        .and_then(|annotations| annotations.get(AUTO_LABEL_ANNOTATION))
        .is_some_and(|value| value == AUTO_LABEL_ANNOTATION_VALUE)
}

#[derive(Debug)]
pub struct PodLabeler<A> {
    driver: LabelDriver<A>,
    backoff: KeyedBackoff,
}

impl<A: PodApi> PodLabeler<A> {
    pub fn new(api: A, config: &ControllerConfig) -> Self {
        Self {
            driver: LabelDriver::managed_by(api),
            backoff: KeyedBackoff::new(
                Duration::from_secs(config.error_requeue_min_secs),
                Duration::from_secs(config.error_requeue_max_secs),
            ),
        }
    }

    async fn label(&self, key: &ResourceKey) -> Action {
        match self.driver.ensure(key).await {
            Ok(PatchResult::Applied) => {
                self.backoff.forget(key);
                metrics::increment_pods_labeled();
                info!("Labelled pod");
                Action::AwaitChange
            }
            Ok(PatchResult::AlreadyApplied) => {
                self.backoff.forget(key);
                metrics::increment_label_patches_skipped();
                debug!("Pod already labelled");
                Action::AwaitChange
            }
            Ok(PatchResult::Gone) => {
                self.backoff.forget(key);
                debug!("Pod no longer exists, dropping key");
                Action::AwaitChange
            }
            Err(e) => {
                metrics::increment_reconciliation_errors("label_patch");
                let (delay, attempts) = self.backoff.record_failure(key);
                warn!(attempts, "Labelling pod failed, retrying in {:?}: {}", delay, e);
                metrics::increment_requeues_total("error_backoff");
                Action::Requeue(delay)
            }
        }
    }
}

#[async_trait]
impl<A: PodApi> Reconcile for PodLabeler<A> {
    async fn reconcile(&self, key: &ResourceKey) -> Action {
        let span = info_span!("label", namespace = %key.namespace, name = %key.name);
        async {
            metrics::increment_reconciliations();
            let started = Instant::now();
            let action = self.label(key).await;
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
