//! Post-filters applied to candidate sets.

use std::collections::BTreeSet;

use log::debug;

use crate::facts::FactDatabase;
use crate::graph::{Endpoint, Graph};
use crate::knowledge::Knowledge;

impl Graph {
    /// Whether `self` refines `other`: same adjacencies, every non-circle mark of `other` is
    /// present in `self`, and `self` resolves at least one circle of `other`.
    pub fn is_more_specific_than(&self, other: &Graph) -> bool {
        if self == other || !self.same_adjacencies(other) {
            return false;
        }
        let mut refines = false;
        for edge in other.edges() {
            for (from, to) in [(edge.node1(), edge.node2()), (edge.node2(), edge.node1())] {
                let theirs = other.endpoint(from, to);
                let ours = self.endpoint(from, to);
                if theirs == Some(Endpoint::Circle) {
                    refines |= ours != theirs;
                } else if ours != theirs {
                    return false;
                }
            }
        }
        refines
    }
}

/// Drops every graph that is more specific than some other graph of the set.
pub fn remove_more_specific(graphs: BTreeSet<Graph>) -> BTreeSet<Graph> {
    let specific: BTreeSet<&Graph> = graphs
        .iter()
        .filter(|g| graphs.iter().any(|other| g.is_more_specific_than(other)))
        .collect();
    if specific.is_empty() {
        return graphs;
    }
    debug!("Removing {} graphs more specific than another candidate", specific.len());
    let keep: Vec<bool> = graphs.iter().map(|g| !specific.contains(g)).collect();
    graphs
        .into_iter()
        .zip(keep)
        .filter_map(|(g, keep)| keep.then_some(g))
        .collect()
}

/// Whether `graph` agrees with the orientations of every input graph.
///
/// Each input edge `X --> Y` needs a semi-directed path from `X` to `Y`. Each input edge
/// `X o-> Y` forbids a semi-directed path from `Y` to `X`.
pub fn corroborates_inputs(graph: &Graph, inputs: &[Graph]) -> bool {
    inputs.iter().flat_map(|input| input.edges()).all(|edge| {
        if let Some((tail, head)) = edge.directed_pair() {
            if !graph.exists_semi_directed_path(tail, head) {
                return false;
            }
        }
        if let Some((circle, head)) = edge.partially_oriented_pair() {
            if graph.exists_semi_directed_path(head, circle) {
                return false;
            }
        }
        true
    })
}

pub fn retain_corroborated(graphs: BTreeSet<Graph>, inputs: &[Graph]) -> BTreeSet<Graph> {
    let before = graphs.len();
    let kept: BTreeSet<Graph> = graphs.into_iter().filter(|g| corroborates_inputs(g, inputs)).collect();
    debug!("Input corroboration kept {} of {} graphs", kept.len(), before);
    kept
}

/// Adjusts `graph` to background knowledge, or rejects it.
///
/// A forbidden `from --> to` rejects the graph if present, turns `from o-> to` into
/// `from <-> to` and `from o-o to` into `from <-o to`. A required `from --> to` rejects the graph
/// if the edge is missing or points into `from`, and turns `from o-> to` and `from o-o to` into
/// `from --> to`. Variables unknown to the graph are ignored.
pub fn screen_for_knowledge(graph: &Graph, knowledge: &dyn Knowledge) -> Option<Graph> {
    let mut g = graph.clone();
    for edge in knowledge.forbidden_edges() {
        let (Some(from), Some(to)) = (graph.node(edge.from()), graph.node(edge.to())) else {
            continue;
        };
        let (Some(at_from), Some(at_to)) = (g.endpoint(to, from), g.endpoint(from, to)) else {
            continue;
        };
        match (at_from, at_to) {
            (Endpoint::Tail, Endpoint::Arrow) => return None,
            (Endpoint::Circle, Endpoint::Arrow | Endpoint::Circle) => {
                g.set_endpoint(to, from, Endpoint::Arrow);
            }
            _ => {}
        }
    }
    for edge in knowledge.required_edges() {
        let (Some(from), Some(to)) = (graph.node(edge.from()), graph.node(edge.to())) else {
            continue;
        };
        let (Some(at_from), Some(at_to)) = (g.endpoint(to, from), g.endpoint(from, to)) else {
            return None;
        };
        match (at_from, at_to) {
            (Endpoint::Arrow, Endpoint::Tail | Endpoint::Circle) => return None,
            (Endpoint::Circle, Endpoint::Arrow | Endpoint::Circle) => {
                g.set_endpoint(to, from, Endpoint::Tail);
                g.set_endpoint(from, to, Endpoint::Arrow);
            }
            _ => {}
        }
    }
    Some(g)
}

/// Screens every graph for `knowledge`, then drops the results that became cyclic or separate an
/// associated pair.
pub fn apply_knowledge(graphs: BTreeSet<Graph>, knowledge: &dyn Knowledge, facts: &FactDatabase) -> BTreeSet<Graph> {
    let before = graphs.len();
    let kept: BTreeSet<Graph> = graphs
        .iter()
        .filter_map(|g| screen_for_knowledge(g, knowledge))
        .filter(|g| {
            let invalid = g.exists_directed_cycle() || facts.predicts_false_independence(g);
            if invalid {
                debug!("Knowledge made a candidate inconsistent:\n{}", g);
            }
            !invalid
        })
        .collect();
    debug!("Knowledge screening kept {} of {} graphs", kept.len(), before);
    kept
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::graph::{Edge, Node};
    use crate::knowledge::BackgroundKnowledge;

    fn pair_graph(edge: impl Fn(&Node, &Node) -> Edge) -> (Graph, Node, Node) {
        let (a, b) = (Node::new("A"), Node::new("B"));
        let mut g = Graph::new([a.clone(), b.clone()]);
        g.add_edge(edge(&a, &b));
        (g, a, b)
    }

    #[test]
    fn test_more_specific() {
        let (circles, a, b) = pair_graph(Edge::nondirected);
        let (directed, _, _) = pair_graph(Edge::directed);
        let (partial, _, _) = pair_graph(Edge::partially_oriented);
        assert!(directed.is_more_specific_than(&circles));
        assert!(directed.is_more_specific_than(&partial));
        assert!(!partial.is_more_specific_than(&directed));
        assert!(!circles.is_more_specific_than(&circles));

        let empty = Graph::new([a, b]);
        assert!(!empty.is_more_specific_than(&circles));

        let all = BTreeSet::from([circles.clone(), directed, partial, empty.clone()]);
        let kept = remove_more_specific(all);
        assert_eq!(kept, BTreeSet::from([circles, empty]));
    }

    #[test]
    fn test_corroboration() {
        let (input, _, _) = pair_graph(Edge::directed);
        let (circles, _, _) = pair_graph(Edge::nondirected);
        let (reversed, _, _) = pair_graph(|a, b| Edge::directed(b, a));
        assert!(corroborates_inputs(&circles, &[input.clone()]));
        assert!(!corroborates_inputs(&reversed, &[input.clone()]));

        let (partial_input, _, _) = pair_graph(Edge::partially_oriented);
        assert!(!corroborates_inputs(&circles, &[partial_input.clone()]));
        assert!(corroborates_inputs(&input, &[partial_input]));
    }

    #[test]
    fn test_forbidden_knowledge() {
        let mut k = BackgroundKnowledge::new();
        k.set_forbidden("A", "B");

        let (directed, _, _) = pair_graph(Edge::directed);
        assert!(screen_for_knowledge(&directed, &k).is_none());

        let (partial, a, b) = pair_graph(Edge::partially_oriented);
        let screened = screen_for_knowledge(&partial, &k).unwrap();
        assert_eq!(screened.edge(&a, &b), Some(Edge::bidirected(&a, &b)));

        let (circles, a, b) = pair_graph(Edge::nondirected);
        let screened = screen_for_knowledge(&circles, &k).unwrap();
        assert_eq!(screened.edge(&a, &b), Some(Edge::partially_oriented(&b, &a)));
    }

    #[test]
    fn test_required_knowledge() {
        let mut k = BackgroundKnowledge::new();
        k.set_required("A", "B");

        let (circles, a, b) = pair_graph(Edge::nondirected);
        let screened = screen_for_knowledge(&circles, &k).unwrap();
        assert_eq!(screened.edge(&a, &b), Some(Edge::directed(&a, &b)));

        let (backwards, _, _) = pair_graph(|a, b| Edge::partially_oriented(b, a));
        assert!(screen_for_knowledge(&backwards, &k).is_none());

        let missing = Graph::new([a, b]);
        assert!(screen_for_knowledge(&missing, &k).is_none());
        let facts = FactDatabase::extract(&[]);
        assert_eq!(apply_knowledge(BTreeSet::from([missing, circles]), &k, &facts).len(), 1);
    }

    #[test]
    fn test_required_edge_closing_cycle_is_dropped() {
        // A --> B --> C, A o-o C: requiring C --> A closes a directed cycle.
        let (a, b, c) = (Node::new("A"), Node::new("B"), Node::new("C"));
        let mut g = Graph::new([a.clone(), b.clone(), c.clone()]);
        g.add_edge(Edge::directed(&a, &b));
        g.add_edge(Edge::directed(&b, &c));
        g.add_edge(Edge::nondirected(&a, &c));

        let mut k = BackgroundKnowledge::new();
        k.set_required("C", "A");
        let screened = screen_for_knowledge(&g, &k).unwrap();
        assert!(screened.exists_directed_cycle());

        let facts = FactDatabase::extract(&[]);
        assert!(apply_knowledge(BTreeSet::from([g]), &k, &facts).is_empty());
    }

    #[test]
    fn test_forbidden_edge_causing_false_independence_is_dropped() {
        // A o-> B o-o C: A and C are associated given the empty set.
        let (a, b, c) = (Node::new("A"), Node::new("B"), Node::new("C"));
        let mut input = Graph::new([a.clone(), b.clone(), c.clone()]);
        input.add_edge(Edge::partially_oriented(&a, &b));
        input.add_edge(Edge::nondirected(&b, &c));
        let facts = FactDatabase::extract(&[input.clone()]);
        assert!(facts.is_associated_given(&a, &c, &BTreeSet::new()));

        // Forbidding B --> C turns B o-o C into C o-> B, a collider that separates A and C.
        let mut k = BackgroundKnowledge::new();
        k.set_forbidden("B", "C");
        let screened = screen_for_knowledge(&input, &k).unwrap();
        assert!(screened.is_def_collider(&a, &b, &c));
        assert!(apply_knowledge(BTreeSet::from([input]), &k, &facts).is_empty());
    }
}
