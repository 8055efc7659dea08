//! Paths that could still m-connect a separated pair.
//!
//! A path between `x` and `y` *possibly connects* them given `Z` if some orientation of the
//! remaining circles could make it m-connecting. An interior node `v` keeps the path open when:
//!
//! - `v ∈ Z` and `v` could still become a collider: the triple is not underlined and neither edge
//!   has a tail at `v`;
//! - `v ∉ Z` and `v` is not a definite collider, or it is one with a semi-directed path into `Z`
//!   (so that it may end up an ancestor of the conditioning set).

use std::collections::BTreeSet;
use std::fmt;

use crate::graph::{Endpoint, Graph, Node};

/// One possibly connecting path together with the conditioning set it was checked against.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PossibleConnectingPath {
    path: Vec<Node>,
    conditions: BTreeSet<Node>,
}

impl PossibleConnectingPath {
    /// All possibly connecting paths from `x` to `y` given `conditions`.
    pub fn find(graph: &Graph, x: &Node, y: &Node, conditions: &BTreeSet<Node>) -> Vec<Self> {
        Self::search(graph, x, y, conditions, None)
    }

    /// Possibly connecting paths with exactly `length` edges.
    pub fn find_of_length(graph: &Graph, x: &Node, y: &Node, conditions: &BTreeSet<Node>, length: usize) -> Vec<Self> {
        Self::search(graph, x, y, conditions, Some(length))
    }

    fn search(graph: &Graph, x: &Node, y: &Node, conditions: &BTreeSet<Node>, length: Option<usize>) -> Vec<Self> {
        graph
            .walk_simple_paths(x, y, length, None, |prefix, next| match prefix.len() {
                1 => true,
                n => may_stay_open(graph, &prefix[n - 2], &prefix[n - 1], next, conditions),
            })
            .into_iter()
            .filter(|path| length.map_or(true, |l| path.len() == l + 1))
            .map(|path| Self {
                path,
                conditions: conditions.clone(),
            })
            .collect()
    }

    pub fn path(&self) -> &[Node] {
        &self.path
    }

    pub fn conditions(&self) -> &BTreeSet<Node> {
        &self.conditions
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.path.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Conditioning nodes not on the path.
    pub fn outside_conditions(&self) -> Vec<&Node> {
        self.conditions.iter().filter(|c| !self.path.contains(c)).collect()
    }
}

impl fmt::Display for PossibleConnectingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.path.iter().map(|n| n.name()).collect();
        let conditions: Vec<&str> = self.conditions.iter().map(|n| n.name()).collect();
        write!(f, "{} | {{{}}}", names.join(" - "), conditions.join(", "))
    }
}

/// Whether `node` can be an open interior node of a path `prev - node - next` given `conditions`.
pub fn may_stay_open(graph: &Graph, prev: &Node, node: &Node, next: &Node, conditions: &BTreeSet<Node>) -> bool {
    if conditions.contains(node) {
        !graph.is_underline(prev, node, next)
            && graph.endpoint(prev, node) != Some(Endpoint::Tail)
            && graph.endpoint(next, node) != Some(Endpoint::Tail)
    } else if graph.is_def_collider(prev, node, next) {
        conditions.iter().any(|z| graph.exists_semi_directed_path(node, z))
    } else {
        true
    }
}
