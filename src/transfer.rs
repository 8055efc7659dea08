//! Local transfer: merges the input graphs into one working graph over all variables.

use std::collections::BTreeSet;

use log::debug;

use crate::graph::{Edge, Endpoint, Graph, Node, NodePair};

/// Pairs measured together in some input graph but not adjacent there.
pub fn nonadjacencies(inputs: &[Graph]) -> BTreeSet<NodePair> {
    let mut pairs = BTreeSet::new();
    for input in inputs {
        let nodes: Vec<&Node> = input.nodes().collect();
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                if !input.is_adjacent(nodes[i], nodes[j]) {
                    pairs.insert(NodePair::new(nodes[i], nodes[j]));
                }
            }
        }
    }
    pairs
}

/// Pairs of `variables` never measured together in a single input graph.
pub fn placeholder_pairs(variables: &[Node], inputs: &[Graph]) -> BTreeSet<NodePair> {
    let mut pairs = BTreeSet::new();
    for i in 0..variables.len() {
        for j in (i + 1)..variables.len() {
            let (a, b) = (&variables[i], &variables[j]);
            if !inputs.iter().any(|g| g.contains(a.name()) && g.contains(b.name())) {
                pairs.insert(NodePair::new(a, b));
            }
        }
    }
    pairs
}

/// Merges an incoming mark into the current one.
///
/// A circle never overrides anything. An arrow meeting a tail (or vice versa) becomes a circle.
pub fn merge_endpoint(current: Endpoint, incoming: Endpoint) -> Endpoint {
    match (current, incoming) {
        (_, Endpoint::Circle) => current,
        (Endpoint::Arrow, Endpoint::Tail) | (Endpoint::Tail, Endpoint::Arrow) => Endpoint::Circle,
        _ => incoming,
    }
}

/// Copies adjacencies, marks and underlines from every input into `graph`.
///
/// Edges between pairs known to be nonadjacent in some input are skipped. A mark that two inputs
/// disagree on stays a circle, whatever the other inputs say, so the result does not depend on
/// the order of `inputs`. Placeholder pairs get a `o-o` edge. Returns the placeholder pairs.
pub fn transfer_local(graph: &mut Graph, variables: &[Node], inputs: &[Graph]) -> BTreeSet<NodePair> {
    let nonadjacent = nonadjacencies(inputs);
    // (from, to) marks at `to` that met an arrow and a tail.
    let mut conflicts: BTreeSet<(Node, Node)> = BTreeSet::new();
    for input in inputs {
        for edge in input.edges() {
            if nonadjacent.contains(&edge.pair()) {
                continue;
            }
            let (a, b) = (edge.node1(), edge.node2());
            if !graph.is_adjacent(a, b) {
                graph.add_edge(edge.clone());
                continue;
            }
            for (from, to) in [(a, b), (b, a)] {
                if conflicts.contains(&(from.clone(), to.clone())) {
                    continue;
                }
                let incoming = edge.proximal_endpoint(to).unwrap_or(Endpoint::Circle);
                if let Some(current) = graph.endpoint(from, to) {
                    let merged = merge_endpoint(current, incoming);
                    if merged == Endpoint::Circle && incoming != Endpoint::Circle {
                        conflicts.insert((from.clone(), to.clone()));
                    }
                    graph.set_endpoint(from, to, merged);
                }
            }
        }
        for triple in input.underlines() {
            if graph.is_along_path(triple.x(), triple.y(), triple.z()) {
                graph.add_underline(triple.x(), triple.y(), triple.z());
            }
        }
    }

    let placeholders = placeholder_pairs(variables, inputs);
    for pair in &placeholders {
        graph.add_edge(Edge::nondirected(pair.first(), pair.second()));
    }
    debug!(
        "Local transfer: {} edges ({} placeholders), {} underlines, {} known nonadjacencies",
        graph.num_edges(),
        placeholders.len(),
        graph.underlines().count(),
        nonadjacent.len()
    );
    placeholders
}
