//! # Resource Keys
//!
//! Namespace/name identity used to deduplicate and serialize work.

use kube::{Resource, ResourceExt};
use std::fmt;

/// Identity of a watched object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key for a Kubernetes object, `None` when the object has no name
    pub fn from_resource<K: Resource>(obj: &K) -> Option<Self> {
        let name = obj.meta().name.clone()?;
        Some(Self {
            namespace: obj.namespace().unwrap_or_default(),
            name,
        })
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::Pod;
    use kube::api::ObjectMeta;

    #[test]
    fn test_key_from_resource() {
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some("web-0".to_string()),
                namespace: Some("shop".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let key = ResourceKey::from_resource(&pod).unwrap();
        assert_eq!(key, ResourceKey::new("shop", "web-0"));
        assert_eq!(key.to_string(), "shop/web-0");
    }

    #[test]
    fn test_unnamed_resource_has_no_key() {
        assert_eq!(ResourceKey::from_resource(&Pod::default()), None);
    }
}
