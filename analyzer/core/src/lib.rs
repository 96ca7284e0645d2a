//! Network policy reachability analysis.
//!
//! Given a point-in-time snapshot of a cluster's pods, services, namespaces,
//! and network policies, computes which ordered pod pairs may exchange
//! traffic and on which ports, under the default-deny-with-allow-list model:
//!
//! - A pod is isolated for a direction once at least one policy in its
//!   namespace selects it and declares that direction.
//! - An isolated pod only accepts traffic matched by one of its policies'
//!   rules; peers combine pod and namespace selectors (AND within a peer,
//!   OR across peers).
//! - A route's ports are the intersection of the two sides' allowed ports;
//!   a disjoint intersection denies the route outright.
//!
//! The analysis is synchronous and pure: it performs no I/O, holds no state
//! across runs, and can be invoked concurrently on independent snapshots.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod labels;
mod isolation;
mod policy;
mod routes;
mod service;
mod traffic;
mod workload;


pub use self::{
    isolation::{isolation_of, PodIsolation},
    labels::{Labels, Selector},
    policy::{IpNet, NetworkPolicy, Peer, PolicyRef, PolicyTypes, PortFilter, Rule},
    routes::{allowed_route_between, AllowedRoute},
    service::{target_pods, ServiceInfo},
    traffic::allowed_routes,
    workload::{Namespace, Pod, PodRef, Service},
};

use serde::Serialize;

/// A fully-materialized cluster snapshot, as produced by the watch layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub pods: Vec<Pod>,
    pub services: Vec<Service>,
    pub network_policies: Vec<NetworkPolicy>,
    pub namespaces: Vec<Namespace>,
}

/// The complete result of one analysis pass, serializable for the API layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub pods: Vec<Pod>,
    pub services: Vec<ServiceInfo>,
    pub network_policies: Vec<PolicyRef>,
    pub allowed_routes: Vec<AllowedRoute>,
}

/// Runs one full analysis pass over a snapshot.
pub fn analyze(snapshot: &Snapshot) -> AnalysisResult {
    let allowed_routes = allowed_routes(
        &snapshot.pods,
        &snapshot.network_policies,
        &snapshot.namespaces,
    );

    let services = snapshot
        .services
        .iter()
        .map(|service| target_pods(service, &snapshot.pods))
        .collect();

    AnalysisResult {
        pods: snapshot.pods.clone(),
        services,
        network_policies: snapshot
            .network_policies
            .iter()
            .map(NetworkPolicy::to_ref)
            .collect(),
        allowed_routes,
    }
}
