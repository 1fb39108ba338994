//! # Label Driver
//!
//! Conditional merge patch: re-reads the Pod and only patches when at least one
//! of the wanted labels is missing or different. The patch carries just the
//! wanted labels.

use crate::constants::{MANAGED_BY_LABEL, MANAGED_BY_VALUE};
use crate::controller::api::{ApiError, PodApi};
use crate::controller::key::ResourceKey;
use k8s_openapi::api::core::v1::Pod;
use std::collections::BTreeMap;
use tracing::debug;

/// What `LabelDriver::ensure` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchResult {
    Applied,
    /// The labels were already present; no API write was made
    AlreadyApplied,
    /// The Pod no longer exists
    Gone,
}

#[derive(Debug, Clone)]
pub struct LabelDriver<A> {
    api: A,
    labels: BTreeMap<String, String>,
}

impl<A: PodApi> LabelDriver<A> {
    pub fn new(api: A, labels: BTreeMap<String, String>) -> Self {
        Self { api, labels }
    }

    /// Driver that applies `managed-by=custom-controller`
    pub fn managed_by(api: A) -> Self {
        Self::new(
            api,
            BTreeMap::from([(MANAGED_BY_LABEL.to_string(), MANAGED_BY_VALUE.to_string())]),
        )
    }

    pub async fn ensure(&self, key: &ResourceKey) -> Result<PatchResult, ApiError> {
        let pod = match self.api.get(key).await {
            Ok(pod) => pod,
            Err(ApiError::NotFound) => return Ok(PatchResult::Gone),
            Err(e) => return Err(e),
        };

        if has_labels(&pod, &self.labels) {
            debug!("Labels already present, skipping patch");
            return Ok(PatchResult::AlreadyApplied);
        }

        match self.api.patch_labels(key, &self.labels).await {
            Ok(()) => Ok(PatchResult::Applied),
            Err(ApiError::NotFound) => Ok(PatchResult::Gone),
            Err(e) => Err(e),
        }
    }
}

/// Whether every entry of `wanted` is already set on `pod`
#[must_use]
pub fn has_labels(pod: &Pod, wanted: &BTreeMap<String, String>) -> bool {
    let current = pod.metadata.labels.as_ref();
    wanted
        .iter()
        .all(|(k, v)| current.and_then(|labels| labels.get(k)) == Some(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ObjectMeta;

    fn pod_with_labels(labels: &[(&str, &str)]) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some("web-0".to_string()),
                labels: Some(
                    labels
                        .iter()
                        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                        .collect(),
                ),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_has_labels() {
        let wanted = BTreeMap::from([("managed-by".to_string(), "custom-controller".to_string())]);

        assert!(has_labels(
            &pod_with_labels(&[("managed-by", "custom-controller"), ("app", "web")]),
            &wanted
        ));
        assert!(!has_labels(&pod_with_labels(&[("app", "web")]), &wanted));
        assert!(!has_labels(
            &pod_with_labels(&[("managed-by", "someone-else")]),
            &wanted
        ));
        assert!(!has_labels(&Pod::default(), &wanted));
    }
}
