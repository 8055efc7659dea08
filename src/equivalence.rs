//! Equivalence enumeration.
//!
//! A skeleton that survived redundancy elimination may still hold unshielded triples whose
//! collider status nothing has decided. Every subset of them is tried as the set of colliders,
//! and each such disambiguation is propagated by the [final orientation](crate::orientation).

use std::collections::BTreeSet;

use log::debug;
use num_bigint::BigUint;

use crate::facts::FactDatabase;
use crate::graph::{Endpoint, Graph, Triple};
use crate::knowledge::Knowledge;
use crate::orientation::FinalOrientation;
use crate::subsets::PowerSet;

impl Graph {
    /// Unshielded triples that are neither underlined nor a definite collider or noncollider.
    pub fn ambiguous_triples(&self) -> Vec<Triple> {
        self.triples()
            .into_iter()
            .filter(|t| {
                let (x, y, z) = (t.x(), t.y(), t.z());
                !self.is_adjacent(x, z)
                    && !self.is_underline(x, y, z)
                    && !self.is_def_collider(x, y, z)
                    && !self.is_def_noncollider(x, y, z)
            })
            .collect()
    }
}

/// Enumerates the disambiguations of every skeleton and keeps the oriented graphs that are
/// acyclic and predict no false independence.
///
/// Returns the surviving graphs, with underlines cleared, and the total number of
/// disambiguations tried.
pub fn enumerate_equivalents(
    skeletons: &BTreeSet<Graph>,
    facts: &FactDatabase,
    knowledge: Option<&dyn Knowledge>,
) -> (BTreeSet<Graph>, BigUint) {
    let orienter = FinalOrientation::new(facts, knowledge);
    let mut branches = BigUint::default();
    let mut result = BTreeSet::new();

    for pag in skeletons {
        let subsets = PowerSet::new(pag.ambiguous_triples());
        debug!(
            "{} ambiguous triples, {} disambiguations",
            subsets.items().len(),
            subsets.size()
        );
        branches += subsets.size();

        for colliders in subsets {
            let mut g = pag.clone();
            for t in &colliders {
                g.set_endpoint(t.x(), t.y(), Endpoint::Arrow);
                g.set_endpoint(t.z(), t.y(), Endpoint::Arrow);
            }
            for mut oriented in orienter.orient(g) {
                if oriented.exists_directed_cycle() || facts.predicts_false_independence(&oriented) {
                    continue;
                }
                oriented.clear_underlines();
                result.insert(oriented);
            }
        }
    }
    debug!("Equivalence enumeration kept {} graphs", result.len());
    (result, branches)
}
