//! Maintains a point-in-time snapshot of the cluster resources the analyzer
//! consumes.
//!
//! Watch events for pods, services, namespaces, and network policies are
//! folded into a shared index; every effective change is published on a
//! single-slot watch channel so the analysis worker can recompute from a
//! fresh snapshot. Notifications overwrite one another rather than queue:
//! the worker always recomputes from the latest state.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod convert;

#[cfg(test)]
mod tests;

use ahash::AHashMap;
use k8s_openapi::api::{core::v1 as corev1, networking::v1 as networkingv1};
use kube::ResourceExt;
use netpol_analyzer_core as core;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;

pub type SharedIndex = Arc<RwLock<Index>>;

/// Holds the last observed state of each watched resource, keyed by
/// namespace and name. Owned by the watch tasks; read by the analysis
/// worker when it materializes a snapshot.
#[derive(Debug)]
pub struct Index {
    pods: AHashMap<ResourceId, core::Pod>,
    services: AHashMap<ResourceId, core::Service>,
    network_policies: AHashMap<ResourceId, core::NetworkPolicy>,
    namespaces: AHashMap<String, core::Namespace>,

    changes: watch::Sender<()>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
struct ResourceId {
    namespace: String,
    name: String,
}

// === impl Index ===

impl Index {
    pub fn shared() -> (SharedIndex, watch::Receiver<()>) {
        let (changes, changed) = watch::channel(());
        let index = Self {
            pods: AHashMap::new(),
            services: AHashMap::new(),
            network_policies: AHashMap::new(),
            namespaces: AHashMap::new(),
            changes,
        };
        (Arc::new(RwLock::new(index)), changed)
    }

    /// Materializes the current state as an immutable snapshot. Resource
    /// lists are sorted by namespace and name so analysis output does not
    /// depend on watch event ordering.
    pub fn snapshot(&self) -> core::Snapshot {
        let mut pods: Vec<_> = self.pods.values().cloned().collect();
        pods.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));

        let mut services: Vec<_> = self.services.values().cloned().collect();
        services.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));

        let mut network_policies: Vec<_> = self.network_policies.values().cloned().collect();
        network_policies.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));

        let mut namespaces: Vec<_> = self.namespaces.values().cloned().collect();
        namespaces.sort_by(|a, b| a.name.cmp(&b.name));

        core::Snapshot {
            pods,
            services,
            network_policies,
            namespaces,
        }
    }

    fn changed(&mut self) {
        self.changes.send_replace(());
    }

    fn apply_keyed<V: PartialEq>(
        store: &mut AHashMap<ResourceId, V>,
        id: ResourceId,
        value: V,
    ) -> bool {
        if store.get(&id) == Some(&value) {
            return false;
        }
        store.insert(id, value);
        true
    }
}

fn resource_id<T: ResourceExt>(resource: &T) -> ResourceId {
    ResourceId {
        namespace: resource.namespace().expect("resource must be namespaced"),
        name: resource.name_unchecked(),
    }
}

impl kubert::index::IndexNamespacedResource<corev1::Pod> for Index {
    fn apply(&mut self, resource: corev1::Pod) {
        let id = resource_id(&resource);
        tracing::debug!(ns = %id.namespace, name = %id.name, "Applying pod");
        if Self::apply_keyed(&mut self.pods, id, convert::pod(resource)) {
            self.changed();
        }
    }

    fn delete(&mut self, namespace: String, name: String) {
        if self.pods.remove(&ResourceId { namespace, name }).is_some() {
            self.changed();
        }
    }
}

impl kubert::index::IndexNamespacedResource<corev1::Service> for Index {
    fn apply(&mut self, resource: corev1::Service) {
        let id = resource_id(&resource);
        tracing::debug!(ns = %id.namespace, name = %id.name, "Applying service");
        if Self::apply_keyed(&mut self.services, id, convert::service(resource)) {
            self.changed();
        }
    }

    fn delete(&mut self, namespace: String, name: String) {
        if self
            .services
            .remove(&ResourceId { namespace, name })
            .is_some()
        {
            self.changed();
        }
    }
}

impl kubert::index::IndexNamespacedResource<networkingv1::NetworkPolicy> for Index {
    fn apply(&mut self, resource: networkingv1::NetworkPolicy) {
        let id = resource_id(&resource);
        tracing::debug!(ns = %id.namespace, name = %id.name, "Applying network policy");
        if Self::apply_keyed(
            &mut self.network_policies,
            id,
            convert::network_policy(resource),
        ) {
            self.changed();
        }
    }

    fn delete(&mut self, namespace: String, name: String) {
        if self
            .network_policies
            .remove(&ResourceId { namespace, name })
            .is_some()
        {
            self.changed();
        }
    }
}

impl kubert::index::IndexClusterResource<corev1::Namespace> for Index {
    fn apply(&mut self, resource: corev1::Namespace) {
        let name = resource.name_unchecked();
        tracing::debug!(%name, "Applying namespace");
        let ns = convert::namespace(resource);
        if self.namespaces.get(&name) != Some(&ns) {
            self.namespaces.insert(name, ns);
            self.changed();
        }
    }

    fn delete(&mut self, name: String) {
        if self.namespaces.remove(&name).is_some() {
            self.changed();
        }
    }
}
