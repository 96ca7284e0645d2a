use crate::labels::{Labels, Selector};
use serde::Serialize;

/// A pod observed in the cluster snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
    pub name: String,
    pub namespace: String,
    pub labels: Labels,
}

/// A namespace observed in the cluster snapshot. Only used as a selector
/// target for namespace-scoped policy peers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Namespace {
    pub name: String,
    pub labels: Labels,
}

/// A service observed in the cluster snapshot.
///
/// The selector is optional: unlike policy selectors, an absent service
/// selector targets no pods at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    pub namespace: String,
    pub selector: Option<Selector>,
}

/// Identifies a pod in analysis output.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodRef {
    pub name: String,
    pub namespace: String,
}

// === impl Pod ===

impl Pod {
    pub fn to_ref(&self) -> PodRef {
        PodRef {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

impl Namespace {
    /// Looks a namespace up by name. An unresolved reference is a valid "not
    /// found" state; peer selectors treat it as a non-match.
    pub fn find<'n>(namespaces: &'n [Namespace], name: &str) -> Option<&'n Namespace> {
        namespaces.iter().find(|ns| ns.name == name)
    }
}
