//! Independence facts extracted from the input graphs.
//!
//! For every pair of variables measured together in some input graph, and every subset `Z` of
//! that graph's remaining variables, the input graph either m-separates the pair given `Z` (a
//! *separation*) or not (an *association*). The [`FactDatabase`] collects both kinds, keyed by
//! the unordered pair. A pair may carry separations and associations at the same time, for
//! different conditioning sets.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::debug;

use crate::graph::{Graph, Node, NodePair};
use crate::subsets::PowerSet;

/// A pair of variables together with all conditioning sets recorded for it.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct IndependenceFact {
    pair: NodePair,
    conditioning: BTreeSet<BTreeSet<Node>>,
}

impl IndependenceFact {
    pub fn new(x: &Node, y: &Node) -> Self {
        Self {
            pair: NodePair::new(x, y),
            conditioning: BTreeSet::new(),
        }
    }

    pub fn pair(&self) -> &NodePair {
        &self.pair
    }

    pub fn x(&self) -> &Node {
        self.pair.first()
    }

    pub fn y(&self) -> &Node {
        self.pair.second()
    }

    pub fn add_conditioning_set(&mut self, z: BTreeSet<Node>) -> bool {
        self.conditioning.insert(z)
    }

    pub fn conditioning_sets(&self) -> impl Iterator<Item = &BTreeSet<Node>> + '_ {
        self.conditioning.iter()
    }

    pub fn contains(&self, z: &BTreeSet<Node>) -> bool {
        self.conditioning.contains(z)
    }

    /// Whether the empty set is one of the conditioning sets.
    pub fn is_unconditional(&self) -> bool {
        self.conditioning.contains(&BTreeSet::new())
    }

    pub fn len(&self) -> usize {
        self.conditioning.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditioning.is_empty()
    }
}

impl fmt::Display for IndependenceFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {} | ", self.x(), self.y())?;
        let sets: Vec<String> = self
            .conditioning
            .iter()
            .map(|z| {
                let names: Vec<&str> = z.iter().map(|n| n.name()).collect();
                format!("{{{}}}", names.join(", "))
            })
            .collect();
        write!(f, "{}", sets.join(" "))
    }
}

/// Separations and associations observed across all input graphs.
#[derive(Debug, Clone, Default)]
pub struct FactDatabase {
    separations: BTreeMap<NodePair, IndependenceFact>,
    associations: BTreeMap<NodePair, IndependenceFact>,
}

impl FactDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queries every input graph for every pair and every conditioning subset of its other
    /// variables.
    ///
    /// # Panics
    ///
    /// Panics if an input graph has more than 65 variables (the conditioning power set would not
    /// fit the enumerator).
    pub fn extract(inputs: &[Graph]) -> Self {
        let mut db = Self::new();
        for (i, input) in inputs.iter().enumerate() {
            let nodes: Vec<&Node> = input.nodes().collect();
            for a in 0..nodes.len() {
                for b in (a + 1)..nodes.len() {
                    let (x, y) = (nodes[a], nodes[b]);
                    let adjacent = input.is_adjacent(x, y);
                    let others: Vec<Node> = nodes.iter().copied().filter(|&n| n != x && n != y).cloned().collect();
                    for subset in PowerSet::new(others) {
                        let z: BTreeSet<Node> = subset.into_iter().collect();
                        if !adjacent && input.is_m_separated(x, y, &z) {
                            db.add_separation(x, y, z);
                        } else {
                            db.add_association(x, y, z);
                        }
                    }
                }
            }
            debug!(
                "Extracted facts from input graph {} ({} variables): {} separated pairs, {} associated pairs so far",
                i,
                nodes.len(),
                db.separations.len(),
                db.associations.len()
            );
        }
        db
    }

    pub fn add_separation(&mut self, x: &Node, y: &Node, z: BTreeSet<Node>) -> bool {
        self.separations
            .entry(NodePair::new(x, y))
            .or_insert_with(|| IndependenceFact::new(x, y))
            .add_conditioning_set(z)
    }

    pub fn add_association(&mut self, x: &Node, y: &Node, z: BTreeSet<Node>) -> bool {
        self.associations
            .entry(NodePair::new(x, y))
            .or_insert_with(|| IndependenceFact::new(x, y))
            .add_conditioning_set(z)
    }

    pub fn separations(&self) -> impl Iterator<Item = &IndependenceFact> + '_ {
        self.separations.values()
    }

    pub fn associations(&self) -> impl Iterator<Item = &IndependenceFact> + '_ {
        self.associations.values()
    }

    pub fn separation(&self, x: &Node, y: &Node) -> Option<&IndependenceFact> {
        self.separations.get(&NodePair::new(x, y))
    }

    pub fn association(&self, x: &Node, y: &Node) -> Option<&IndependenceFact> {
        self.associations.get(&NodePair::new(x, y))
    }

    pub fn is_separated_given(&self, x: &Node, y: &Node, z: &BTreeSet<Node>) -> bool {
        self.separation(x, y).is_some_and(|f| f.contains(z))
    }

    pub fn is_associated_given(&self, x: &Node, y: &Node, z: &BTreeSet<Node>) -> bool {
        self.association(x, y).is_some_and(|f| f.contains(z))
    }

    /// Associations holding given the empty set.
    pub fn unconditional_associations(&self) -> impl Iterator<Item = &IndependenceFact> + '_ {
        self.associations.values().filter(|f| f.is_unconditional())
    }

    pub fn num_separations(&self) -> usize {
        self.separations.values().map(|f| f.len()).sum()
    }

    pub fn num_associations(&self) -> usize {
        self.associations.values().map(|f| f.len()).sum()
    }

    /// Whether `graph` m-separates some pair given a conditioning set recorded as an association.
    pub fn predicts_false_independence(&self, graph: &Graph) -> bool {
        self.associations.values().any(|fact| {
            fact.conditioning_sets()
                .any(|z| graph.is_m_separated(fact.x(), fact.y(), z))
        })
    }
}
