use crate::{
    isolation::{isolation_of, PodIsolation},
    policy::NetworkPolicy,
    routes::{allowed_route_between, AllowedRoute},
    workload::{Namespace, Pod},
};

/// Computes the full list of allowed routes for a snapshot.
///
/// Isolation is classified once per pod and reused across all pairs, so the
/// pass is O(pods^2) route resolutions rather than O(pods^2) classifications.
/// Self-pairs are skipped. Output order follows input pod order and is
/// deterministic for a fixed snapshot.
pub fn allowed_routes(
    pods: &[Pod],
    policies: &[NetworkPolicy],
    namespaces: &[Namespace],
) -> Vec<AllowedRoute> {
    let isolations: Vec<PodIsolation<'_>> = pods
        .iter()
        .map(|pod| isolation_of(pod, policies))
        .collect();

    let mut routes = Vec::new();
    for (i, source) in isolations.iter().enumerate() {
        for (j, target) in isolations.iter().enumerate() {
            if i == j {
                continue;
            }
            if let Some(route) = allowed_route_between(source, target, namespaces) {
                routes.push(route);
            }
        }
    }
    routes
}
