//! Lossy, infallible conversions from Kubernetes API resources into the
//! core snapshot model.

use k8s_openapi::{
    api::{core::v1 as corev1, networking::v1 as networkingv1},
    apimachinery::pkg::{
        apis::meta::v1::LabelSelector,
        util::intstr::IntOrString,
    },
};
use kube::ResourceExt;
use netpol_analyzer_core as core;

pub(crate) fn pod(pod: corev1::Pod) -> core::Pod {
    core::Pod {
        name: pod.name_unchecked(),
        namespace: pod.namespace().unwrap_or_default(),
        labels: pod.metadata.labels.unwrap_or_default().into(),
    }
}

pub(crate) fn namespace(ns: corev1::Namespace) -> core::Namespace {
    core::Namespace {
        name: ns.name_unchecked(),
        labels: ns.metadata.labels.unwrap_or_default().into(),
    }
}

pub(crate) fn service(svc: corev1::Service) -> core::Service {
    core::Service {
        name: svc.name_unchecked(),
        namespace: svc.namespace().unwrap_or_default(),
        // An absent selector stays absent: such services target no pods.
        selector: svc
            .spec
            .and_then(|spec| spec.selector)
            .map(core::Selector::from_map),
    }
}

pub(crate) fn network_policy(policy: networkingv1::NetworkPolicy) -> core::NetworkPolicy {
    let name = policy.name_unchecked();
    let namespace = policy.namespace().unwrap_or_default();
    let labels = policy.metadata.labels.unwrap_or_default().into();
    let spec = policy.spec.unwrap_or_default();

    let types = policy_types(spec.policy_types.as_deref(), spec.egress.as_deref());

    core::NetworkPolicy {
        name,
        namespace,
        labels,
        pod_selector: selector(spec.pod_selector),
        types,
        ingress: spec
            .ingress
            .into_iter()
            .flatten()
            .map(|rule| mk_rule(rule.from, rule.ports))
            .collect(),
        egress: spec
            .egress
            .into_iter()
            .flatten()
            .map(|rule| mk_rule(rule.to, rule.ports))
            .collect(),
    }
}

/// Resolves the `policyTypes` default: when absent, `Ingress` is implied and
/// `Egress` is implied only when egress rules are present.
fn policy_types(
    declared: Option<&[String]>,
    egress: Option<&[networkingv1::NetworkPolicyEgressRule]>,
) -> core::PolicyTypes {
    match declared {
        Some(types) => core::PolicyTypes {
            ingress: types.iter().any(|t| t == "Ingress"),
            egress: types.iter().any(|t| t == "Egress"),
        },
        None => core::PolicyTypes {
            ingress: true,
            egress: egress.map(|rules| !rules.is_empty()).unwrap_or(false),
        },
    }
}

fn mk_rule(
    peers: Option<Vec<networkingv1::NetworkPolicyPeer>>,
    ports: Option<Vec<networkingv1::NetworkPolicyPort>>,
) -> core::Rule {
    core::Rule {
        peers: peers.into_iter().flatten().map(peer).collect(),
        ports: port_filter(ports),
    }
}

fn peer(peer: networkingv1::NetworkPolicyPeer) -> core::Peer {
    core::Peer {
        pod_selector: peer.pod_selector.map(selector),
        namespace_selector: peer.namespace_selector.map(selector),
        // Unparseable CIDRs are dropped; either way an ipBlock peer never
        // matches a pod candidate.
        ip_block: peer.ip_block.and_then(|block| block.cidr.parse().ok()),
    }
}

/// An absent or empty port list means all ports. Named ports cannot be
/// resolved here and are dropped, leaving them unmatched; a rule that listed
/// only named ports therefore allows no ports at all.
fn port_filter(ports: Option<Vec<networkingv1::NetworkPolicyPort>>) -> core::PortFilter {
    match ports {
        None => core::PortFilter::All,
        Some(ports) if ports.is_empty() => core::PortFilter::All,
        Some(ports) => ports
            .into_iter()
            .filter_map(|p| match p.port {
                Some(IntOrString::Int(n)) => u16::try_from(n).ok(),
                Some(IntOrString::String(_)) | None => None,
            })
            .collect(),
    }
}

fn selector(selector: LabelSelector) -> core::Selector {
    let exprs = selector.match_expressions.map(|exprs| {
        exprs
            .into_iter()
            .map(|req| {
                let values = req.values.into_iter().flatten().collect();
                let operator = match req.operator.as_str() {
                    "In" => core::labels::Operator::In,
                    "NotIn" => core::labels::Operator::NotIn,
                    "Exists" => core::labels::Operator::Exists,
                    "DoesNotExist" => core::labels::Operator::DoesNotExist,
                    // An unknown operator must not widen the selection; In
                    // with no values matches nothing.
                    _ => {
                        tracing::warn!(operator = %req.operator, "Unknown selector operator");
                        return core::labels::Expression {
                            key: req.key,
                            operator: core::labels::Operator::In,
                            values: Default::default(),
                        };
                    }
                };
                core::labels::Expression {
                    key: req.key,
                    operator,
                    values,
                }
            })
            .collect()
    });

    core::Selector::new(selector.match_labels, exprs)
}
