use crate::labels::{Labels, Selector};
use serde::Serialize;
use std::collections::BTreeSet;

pub use ipnet::IpNet;

/// A network policy observed in the cluster snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkPolicy {
    pub name: String,
    pub namespace: String,
    pub labels: Labels,

    /// The policy's own scope: which pods in its namespace it isolates.
    pub pod_selector: Selector,

    pub types: PolicyTypes,

    pub ingress: Vec<Rule>,
    pub egress: Vec<Rule>,
}

/// The directions a policy declares. A policy isolates matching pods only in
/// its declared directions.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PolicyTypes {
    pub ingress: bool,
    pub egress: bool,
}

/// One ingress or egress rule: a peer allow-list plus a port restriction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rule {
    /// Accepted sources (ingress) or destinations (egress). An empty list
    /// accepts everything.
    pub peers: Vec<Peer>,

    pub ports: PortFilter,
}

/// One entry in a rule's peer list. Present selector fields are a
/// conjunction; peers in a rule are a disjunction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Peer {
    pub pod_selector: Option<Selector>,
    pub namespace_selector: Option<Selector>,

    /// Matches traffic by source address, never by pod identity; for
    /// pod-to-pod analysis an ipBlock-only peer accepts no candidate.
    pub ip_block: Option<IpNet>,
}

/// The ports a rule (or a resolved route) applies to.
///
/// `All` is the "no ports listed" sentinel and is distinct from
/// `Matching(empty)`, which allows no ports at all (a rule whose ports could
/// not be resolved to numbers, e.g. named ports).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PortFilter {
    All,
    Matching(BTreeSet<u16>),
}

/// Identifies a policy in analysis output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRef {
    pub name: String,
    pub namespace: String,
    pub labels: Labels,
}

// === impl NetworkPolicy ===

impl NetworkPolicy {
    pub fn to_ref(&self) -> PolicyRef {
        PolicyRef {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            labels: self.labels.clone(),
        }
    }
}

// === impl PortFilter ===

impl Default for PortFilter {
    fn default() -> Self {
        PortFilter::All
    }
}

impl PortFilter {
    /// Combines port sets from independently matching rules on the same side
    /// of a route; the `All` sentinel absorbs any finite set.
    pub fn union(self, other: &PortFilter) -> PortFilter {
        match (self, other) {
            (PortFilter::Matching(mut ports), PortFilter::Matching(others)) => {
                ports.extend(others.iter().copied());
                PortFilter::Matching(ports)
            }
            _ => PortFilter::All,
        }
    }

    /// Combines the two sides of a route; the `All` sentinel is the identity.
    pub fn intersection(self, other: PortFilter) -> PortFilter {
        match (self, other) {
            (PortFilter::All, other) => other,
            (this, PortFilter::All) => this,
            (PortFilter::Matching(ports), PortFilter::Matching(others)) => {
                PortFilter::Matching(ports.intersection(&others).copied().collect())
            }
        }
    }

    /// Whether any traffic can flow under this filter.
    pub fn allows_any(&self) -> bool {
        match self {
            PortFilter::All => true,
            PortFilter::Matching(ports) => !ports.is_empty(),
        }
    }

    /// Whether this filter and `other` share at least one port.
    pub fn intersects(&self, other: &PortFilter) -> bool {
        match (self, other) {
            (PortFilter::All, other) => other.allows_any(),
            (this, PortFilter::All) => this.allows_any(),
            (PortFilter::Matching(ports), PortFilter::Matching(others)) => {
                ports.iter().any(|p| others.contains(p))
            }
        }
    }

    /// The output representation: `None` means unrestricted; finite sets are
    /// emitted sorted ascending without duplicates.
    pub fn into_ports(self) -> Option<Vec<u16>> {
        match self {
            PortFilter::All => None,
            PortFilter::Matching(ports) => Some(ports.into_iter().collect()),
        }
    }
}

impl std::iter::FromIterator<u16> for PortFilter {
    fn from_iter<T: IntoIterator<Item = u16>>(iter: T) -> Self {
        PortFilter::Matching(iter.into_iter().collect())
    }
}
