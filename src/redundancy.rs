//! Redundancy elimination.
//!
//! An unconditional association needs at least one trek to explain it. When a candidate has a
//! single trek for such a pair, that trek is necessary: its edges are kept and its interior
//! triples become noncolliders. Every other edge may or may not be there, so each subset of
//! the removable edges yields its own candidate, unless removing it leaves some unconditionally
//! associated pair without a trek.

use std::collections::BTreeSet;

use log::debug;

use crate::facts::{FactDatabase, IndependenceFact};
use crate::filters::remove_more_specific;
use crate::graph::{Graph, Node, NodePair};
use crate::ion::IonConfig;
use crate::subsets::{is_superset_of_any, PowerSet};

/// Branches every candidate over its removable edges.
///
/// Placeholder edges (between variables never measured together) neither count as treks nor are
/// removable unless `config.remove_placeholder_edges` is set.
pub fn eliminate_redundancy(
    candidates: BTreeSet<Graph>,
    facts: &FactDatabase,
    config: &IonConfig,
    placeholders: &BTreeSet<NodePair>,
) -> BTreeSet<Graph> {
    let unconditional: Vec<&IndependenceFact> = facts.unconditional_associations().collect();
    let is_evidence =
        |a: &Node, b: &Node| config.remove_placeholder_edges || !placeholders.contains(&NodePair::new(a, b));

    let mut result = BTreeSet::new();
    for mut pag in candidates {
        let mut necessary: BTreeSet<NodePair> = BTreeSet::new();
        for fact in &unconditional {
            let treks = pag.treks_with(fact.x(), fact.y(), Some(2), is_evidence);
            if let [trek] = treks.as_slice() {
                for step in trek.windows(2) {
                    necessary.insert(NodePair::new(&step[0], &step[1]));
                }
                for triple in trek.windows(3) {
                    pag.add_underline(&triple[0], &triple[1], &triple[2]);
                }
            }
        }

        let removable: Vec<NodePair> = pag
            .edges()
            .map(|e| e.pair())
            .filter(|p| !necessary.contains(p) && is_evidence(p.first(), p.second()))
            .collect();
        let mut subsets = PowerSet::new(removable);
        debug!(
            "Redundancy: {} necessary edges, {} removal subsets",
            necessary.len(),
            subsets.size()
        );

        // Supersets of a trek-destroying removal destroy that trek too.
        let mut dead: Vec<u64> = Vec::new();
        while let Some((mask, removed)) = subsets.next_with_mask() {
            if is_superset_of_any(mask, &dead) {
                continue;
            }
            let mut candidate = pag.clone();
            for pair in &removed {
                candidate.remove_edge(pair.first(), pair.second());
            }
            let explains_all = unconditional
                .iter()
                .all(|f| !candidate.treks_with(f.x(), f.y(), Some(1), is_evidence).is_empty());
            if !explains_all {
                dead.push(mask);
                continue;
            }
            result.insert(candidate);
        }
    }
    remove_more_specific(result)
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::graph::Edge;

    #[test]
    fn test_single_trek_is_necessary() {
        // X o-o W o-o Y, only X and Y (and their neighbours) associated.
        let (w, x, y) = (Node::new("W"), Node::new("X"), Node::new("Y"));
        let mut g = Graph::new([w.clone(), x.clone(), y.clone()]);
        g.add_edge(Edge::nondirected(&x, &w));
        g.add_edge(Edge::nondirected(&w, &y));
        let mut facts = FactDatabase::new();
        facts.add_association(&x, &y, BTreeSet::new());

        let result = eliminate_redundancy(BTreeSet::from([g]), &facts, &IonConfig::default(), &BTreeSet::new());
        assert_eq!(result.len(), 1);
        let pag = result.first().unwrap();
        assert!(pag.is_adjacent(&x, &w));
        assert!(pag.is_adjacent(&w, &y));
        assert!(pag.is_underline(&x, &w, &y));
    }

    #[test]
    fn test_redundant_edge_branches() {
        // Triangle X, Y, Z with X and Y associated: two treks, so every edge is removable, but at
        // least one trek must remain.
        let (x, y, z) = (Node::new("X"), Node::new("Y"), Node::new("Z"));
        let mut g = Graph::new([x.clone(), y.clone(), z.clone()]);
        g.add_edge(Edge::nondirected(&x, &y));
        g.add_edge(Edge::nondirected(&y, &z));
        g.add_edge(Edge::nondirected(&x, &z));
        let mut facts = FactDatabase::new();
        facts.add_association(&x, &y, BTreeSet::new());

        let result = eliminate_redundancy(BTreeSet::from([g]), &facts, &IonConfig::default(), &BTreeSet::new());
        for pag in &result {
            assert!(!pag.treks(&x, &y).is_empty());
        }
        // Full triangle, minus X-Z, minus Y-Z, minus X-Y, minus both X-Z and Y-Z.
        assert_eq!(result.len(), 5);
    }

    #[test]
    fn test_placeholders_are_kept() {
        let (a, b) = (Node::new("A"), Node::new("B"));
        let mut g = Graph::new([a.clone(), b.clone()]);
        g.add_edge(Edge::nondirected(&a, &b));
        let placeholders = BTreeSet::from([NodePair::new(&a, &b)]);

        let kept = eliminate_redundancy(BTreeSet::from([g.clone()]), &FactDatabase::new(), &IonConfig::default(), &placeholders);
        assert_eq!(kept.into_iter().collect::<Vec<_>>(), vec![g.clone()]);

        let config = IonConfig {
            remove_placeholder_edges: true,
            ..IonConfig::default()
        };
        let branched = eliminate_redundancy(BTreeSet::from([g]), &FactDatabase::new(), &config, &placeholders);
        assert_eq!(branched.len(), 2);
    }
}
