use crate::{policy::NetworkPolicy, workload::Pod};

/// A pod together with the policies that isolate it, per direction.
///
/// A direction with no policies is not isolated: default allow-all applies
/// until at least one policy selects the pod for that direction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PodIsolation<'s> {
    pub pod: &'s Pod,
    pub ingress_policies: Vec<&'s NetworkPolicy>,
    pub egress_policies: Vec<&'s NetworkPolicy>,
}

/// Classifies the policies that apply to `pod`: those in the pod's namespace
/// whose pod selector matches its labels, partitioned by declared direction.
pub fn isolation_of<'s>(pod: &'s Pod, policies: &'s [NetworkPolicy]) -> PodIsolation<'s> {
    let mut ingress_policies = Vec::new();
    let mut egress_policies = Vec::new();

    for policy in policies {
        if policy.namespace != pod.namespace || !policy.pod_selector.matches(&pod.labels) {
            continue;
        }
        if policy.types.ingress {
            ingress_policies.push(policy);
        }
        if policy.types.egress {
            egress_policies.push(policy);
        }
    }

    PodIsolation {
        pod,
        ingress_policies,
        egress_policies,
    }
}

// === impl PodIsolation ===

impl PodIsolation<'_> {
    pub fn is_ingress_isolated(&self) -> bool {
        !self.ingress_policies.is_empty()
    }

    pub fn is_egress_isolated(&self) -> bool {
        !self.egress_policies.is_empty()
    }
}
