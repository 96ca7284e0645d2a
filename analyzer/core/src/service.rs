use crate::workload::{Pod, PodRef, Service};
use serde::Serialize;

/// A service with its resolved target pods, for analysis output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub name: String,
    pub namespace: String,
    pub target_pods: Vec<PodRef>,
}

/// Resolves the pods a service targets: same namespace, and a selector that
/// is present and matches.
///
/// Unlike policy selectors, a service selector is required: a service without
/// one targets nothing, rather than everything.
pub fn target_pods(service: &Service, pods: &[Pod]) -> ServiceInfo {
    let target_pods = pods
        .iter()
        .filter(|pod| pod.namespace == service.namespace)
        .filter(|pod| {
            service
                .selector
                .as_ref()
                .map(|selector| selector.matches(&pod.labels))
                .unwrap_or(false)
        })
        .map(Pod::to_ref)
        .collect();

    ServiceInfo {
        name: service.name.clone(),
        namespace: service.namespace.clone(),
        target_pods,
    }
}
