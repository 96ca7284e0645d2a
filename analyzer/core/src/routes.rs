use crate::{
    isolation::PodIsolation,
    policy::{NetworkPolicy, Peer, PolicyRef, PortFilter, Rule},
    workload::{Namespace, Pod, PodRef},
};
use serde::Serialize;

/// A permitted (source, target) pod pair, the policies that justify it, and
/// the resulting port restriction (`None` means unrestricted).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowedRoute {
    pub source_pod: PodRef,
    pub egress_policies: Vec<PolicyRef>,
    pub target_pod: PodRef,
    pub ingress_policies: Vec<PolicyRef>,
    pub ports: Option<Vec<u16>>,
}

// === impl Rule ===

impl Rule {
    /// Whether this rule accepts `candidate` as a source (ingress rules) or
    /// destination (egress rules). An empty peer list accepts everything;
    /// otherwise any one peer must accept.
    pub fn accepts(&self, candidate: &Pod, namespaces: &[Namespace]) -> bool {
        if self.peers.is_empty() {
            return true;
        }
        self.peers
            .iter()
            .any(|peer| peer.accepts(candidate, namespaces))
    }
}

// === impl Peer ===

impl Peer {
    /// All present selector fields must match. The candidate's namespace is
    /// resolved by name; an unresolved namespace is a non-match, never an
    /// error. ipBlock peers match by source address, not pod identity, so
    /// they accept no pod candidate.
    fn accepts(&self, candidate: &Pod, namespaces: &[Namespace]) -> bool {
        if self.ip_block.is_some() {
            return false;
        }

        if let Some(selector) = &self.namespace_selector {
            match Namespace::find(namespaces, &candidate.namespace) {
                Some(ns) => {
                    if !selector.matches(&ns.labels) {
                        return false;
                    }
                }
                None => return false,
            }
        }

        if let Some(selector) = &self.pod_selector {
            if !selector.matches(&candidate.labels) {
                return false;
            }
        }

        true
    }
}

/// The policies on one side of a route that accept the candidate on the other
/// side, each with the union of its accepting rules' ports.
struct SideMatches<'s> {
    isolated: bool,
    policies: Vec<(&'s NetworkPolicy, PortFilter)>,
}

fn side_matches<'s>(
    policies: &[&'s NetworkPolicy],
    rules_of: impl Fn(&'s NetworkPolicy) -> &'s [Rule],
    candidate: &Pod,
    namespaces: &[Namespace],
) -> SideMatches<'s> {
    let mut matches = Vec::new();
    for &policy in policies {
        let mut ports: Option<PortFilter> = None;
        for rule in rules_of(policy) {
            if rule.accepts(candidate, namespaces) {
                ports = Some(match ports {
                    Some(prior) => prior.union(&rule.ports),
                    None => rule.ports.clone(),
                });
            }
        }
        if let Some(ports) = ports {
            matches.push((policy, ports));
        }
    }
    SideMatches {
        isolated: !policies.is_empty(),
        policies: matches,
    }
}

// === impl SideMatches ===

impl<'s> SideMatches<'s> {
    /// A non-isolated side permits unconditionally; an isolated side permits
    /// iff at least one of its policies matched.
    fn permitted(&self) -> bool {
        !self.isolated || !self.policies.is_empty()
    }

    fn ports(&self) -> PortFilter {
        if !self.isolated {
            return PortFilter::All;
        }
        self.policies
            .iter()
            .fold(PortFilter::Matching(Default::default()), |acc, (_, ports)| {
                acc.union(ports)
            })
    }

    /// The policies to emit on the route: those whose matched ports survive
    /// into the final port set.
    fn refs_allowing(&self, route_ports: &PortFilter) -> Vec<PolicyRef> {
        self.policies
            .iter()
            .filter(|(_, ports)| ports.intersects(route_ports))
            .map(|(policy, _)| policy.to_ref())
            .collect()
    }
}

/// Resolves one ordered pod pair: the source's egress isolation against the
/// target, the target's ingress isolation against the source, and the port
/// intersection of the two. Absence of permission is a normal `None`, not an
/// error; a non-empty policy match with a disjoint port intersection is also
/// a deny (ports are the final gate).
pub fn allowed_route_between(
    source: &PodIsolation<'_>,
    target: &PodIsolation<'_>,
    namespaces: &[Namespace],
) -> Option<AllowedRoute> {
    let egress = side_matches(
        &source.egress_policies,
        |policy| &policy.egress,
        target.pod,
        namespaces,
    );
    let ingress = side_matches(
        &target.ingress_policies,
        |policy| &policy.ingress,
        source.pod,
        namespaces,
    );

    if !egress.permitted() || !ingress.permitted() {
        return None;
    }

    let ports = egress.ports().intersection(ingress.ports());
    if !ports.allows_any() {
        return None;
    }

    Some(AllowedRoute {
        source_pod: source.pod.to_ref(),
        egress_policies: egress.refs_allowing(&ports),
        target_pod: target.pod.to_ref(),
        ingress_policies: ingress.refs_allowing(&ports),
        ports: ports.into_ports(),
    })
}
