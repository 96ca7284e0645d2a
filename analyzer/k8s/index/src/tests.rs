use crate::Index;
use k8s_openapi::{
    api::{core::v1 as corev1, networking::v1 as networkingv1},
    apimachinery::pkg::{apis::meta::v1 as metav1, util::intstr::IntOrString},
};
use kubert::index::{IndexClusterResource, IndexNamespacedResource};
use maplit::btreemap;
use netpol_analyzer_core as core;

fn mk_pod(ns: &str, name: &str) -> corev1::Pod {
    corev1::Pod {
        metadata: metav1::ObjectMeta {
            namespace: Some(ns.to_string()),
            name: Some(name.to_string()),
            labels: Some(btreemap! {
                "app".to_string() => name.to_string(),
            }),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn pod_apply_and_delete_update_the_snapshot() {
    let (index, mut changed) = Index::shared();
    assert!(!changed.has_changed().unwrap());

    IndexNamespacedResource::apply(&mut *index.write(), mk_pod("ns-1", "pod-1"));
    assert!(changed.has_changed().unwrap());
    changed.borrow_and_update();

    let snapshot = index.read().snapshot();
    assert_eq!(snapshot.pods.len(), 1);
    assert_eq!(snapshot.pods[0].name, "pod-1");
    assert_eq!(snapshot.pods[0].namespace, "ns-1");

    // Re-applying an identical resource is not a change.
    IndexNamespacedResource::apply(&mut *index.write(), mk_pod("ns-1", "pod-1"));
    assert!(!changed.has_changed().unwrap());

    IndexNamespacedResource::<corev1::Pod>::delete(
        &mut *index.write(),
        "ns-1".to_string(),
        "pod-1".to_string(),
    );
    assert!(changed.has_changed().unwrap());
    assert_eq!(index.read().snapshot().pods, vec![]);
}

#[test]
fn snapshot_is_sorted_regardless_of_event_order() {
    let (index, _changed) = Index::shared();
    IndexNamespacedResource::apply(&mut *index.write(), mk_pod("ns-b", "pod-2"));
    IndexNamespacedResource::apply(&mut *index.write(), mk_pod("ns-a", "pod-9"));
    IndexNamespacedResource::apply(&mut *index.write(), mk_pod("ns-a", "pod-1"));

    let names: Vec<_> = index
        .read()
        .snapshot()
        .pods
        .iter()
        .map(|p| (p.namespace.clone(), p.name.clone()))
        .collect();
    assert_eq!(
        names,
        vec![
            ("ns-a".to_string(), "pod-1".to_string()),
            ("ns-a".to_string(), "pod-9".to_string()),
            ("ns-b".to_string(), "pod-2".to_string()),
        ],
    );
}

#[test]
fn namespaces_are_indexed_cluster_wide() {
    let (index, changed) = Index::shared();

    IndexClusterResource::apply(&mut *index.write(), corev1::Namespace {
        metadata: metav1::ObjectMeta {
            name: Some("ns-1".to_string()),
            labels: Some(btreemap! {
                "name".to_string() => "ns-1".to_string(),
            }),
            ..Default::default()
        },
        ..Default::default()
    });
    assert!(changed.has_changed().unwrap());

    let snapshot = index.read().snapshot();
    assert_eq!(snapshot.namespaces.len(), 1);
    assert_eq!(snapshot.namespaces[0].name, "ns-1");

    IndexClusterResource::<corev1::Namespace>::delete(&mut *index.write(), "ns-1".to_string());
    assert_eq!(index.read().snapshot().namespaces, vec![]);
}

#[test]
fn service_selector_absence_is_preserved() {
    let (index, _changed) = Index::shared();

    IndexNamespacedResource::apply(&mut *index.write(), corev1::Service {
        metadata: metav1::ObjectMeta {
            namespace: Some("ns-1".to_string()),
            name: Some("headless".to_string()),
            ..Default::default()
        },
        spec: Some(corev1::ServiceSpec::default()),
        ..Default::default()
    });
    IndexNamespacedResource::apply(&mut *index.write(), corev1::Service {
        metadata: metav1::ObjectMeta {
            namespace: Some("ns-1".to_string()),
            name: Some("selecting".to_string()),
            ..Default::default()
        },
        spec: Some(corev1::ServiceSpec {
            selector: Some(btreemap! {
                "app".to_string() => "foo".to_string(),
            }),
            ..Default::default()
        }),
        ..Default::default()
    });

    let snapshot = index.read().snapshot();
    assert_eq!(snapshot.services[0].selector, None);
    assert!(snapshot.services[1].selector.is_some());
}

#[test]
fn network_policy_conversion_resolves_types_rules_and_ports() {
    let (index, _changed) = Index::shared();

    IndexNamespacedResource::apply(&mut *index.write(), networkingv1::NetworkPolicy {
        metadata: metav1::ObjectMeta {
            namespace: Some("ns-1".to_string()),
            name: Some("np".to_string()),
            ..Default::default()
        },
        spec: Some(networkingv1::NetworkPolicySpec {
            pod_selector: metav1::LabelSelector::default(),
            // policyTypes omitted: Ingress is implied, and Egress is implied
            // by the presence of egress rules.
            policy_types: None,
            ingress: Some(vec![networkingv1::NetworkPolicyIngressRule {
                from: Some(vec![networkingv1::NetworkPolicyPeer {
                    pod_selector: Some(metav1::LabelSelector {
                        match_labels: Some(btreemap! {
                            "app".to_string() => "foo".to_string(),
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                }]),
                ports: Some(vec![
                    networkingv1::NetworkPolicyPort {
                        port: Some(IntOrString::Int(8080)),
                        ..Default::default()
                    },
                    // Named ports cannot be resolved and are dropped.
                    networkingv1::NetworkPolicyPort {
                        port: Some(IntOrString::String("admin-http".to_string())),
                        ..Default::default()
                    },
                ]),
            }]),
            egress: Some(vec![networkingv1::NetworkPolicyEgressRule::default()]),
        }),
    });

    let snapshot = index.read().snapshot();
    let policy = &snapshot.network_policies[0];
    assert!(policy.types.ingress);
    assert!(policy.types.egress);
    assert_eq!(policy.ingress.len(), 1);
    assert_eq!(
        policy.ingress[0].ports,
        std::iter::once(8080).collect::<core::PortFilter>(),
    );
    assert_eq!(policy.egress.len(), 1);
    assert_eq!(policy.egress[0].ports, core::PortFilter::All);
    assert!(policy.egress[0].peers.is_empty());
}
