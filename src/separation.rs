//! Ancestral queries, m-separation and path enumeration on a [`Graph`].
//!
//! # Path semantics
//!
//! - A **directed** edge `a --> b` makes `a` a parent of `b`. Ancestors are computed over
//!   directed edges only.
//! - A step `u ⇝ w` is **semi-directed** when the mark at `u` is not an arrowhead and the mark at
//!   `w` is not a tail, i.e. the edge could still be oriented `u --> w`.
//! - A **trek** is a simple path with no definite collider among its interior nodes.
//!
//! All enumerations return paths as node sequences, starting at the source. Enumeration is a
//! depth-first traversal with an explicit stack; every stack entry owns its prefix, so no
//! mutable state is shared between branches.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::graph::{Endpoint, Graph, Node};

impl Graph {
    /// `nodes` together with all their ancestors.
    pub fn ancestors_of<'a>(&self, nodes: impl IntoIterator<Item = &'a Node>) -> BTreeSet<Node> {
        let mut ancestors = BTreeSet::new();
        let mut queue: VecDeque<Node> = nodes.into_iter().cloned().collect();
        while let Some(node) = queue.pop_front() {
            if !ancestors.insert(node.clone()) {
                continue;
            }
            queue.extend(self.parents(&node));
        }
        ancestors
    }

    pub fn is_ancestor_of(&self, a: &Node, b: &Node) -> bool {
        self.ancestors_of([b]).contains(a)
    }

    /// Whether some path between `x` and `y` is m-connecting given `z`.
    ///
    /// A path is m-connecting when every definite collider on it is an ancestor of `z` and every
    /// other interior node is outside `z`.
    pub fn is_m_connected(&self, x: &Node, y: &Node, z: &BTreeSet<Node>) -> bool {
        if x == y {
            return true;
        }
        if !self.contains(x.name()) || !self.contains(y.name()) {
            return false;
        }
        let ancestors = self.ancestors_of(z);

        // States are traversed edges `(prev, node)`.
        let mut visited: BTreeSet<(Node, Node)> = BTreeSet::new();
        let mut queue: VecDeque<(Node, Node)> = VecDeque::new();
        for w in self.adjacent_nodes(x) {
            if w == y {
                return true;
            }
            queue.push_back((x.clone(), w.clone()));
        }
        while let Some((prev, node)) = queue.pop_front() {
            if !visited.insert((prev.clone(), node.clone())) {
                continue;
            }
            for next in self.adjacent_nodes(&node) {
                if *next == prev {
                    continue;
                }
                let open = if self.is_def_collider(&prev, &node, next) {
                    ancestors.contains(&node)
                } else {
                    !z.contains(&node)
                };
                if !open {
                    continue;
                }
                if next == y {
                    return true;
                }
                queue.push_back((node.clone(), next.clone()));
            }
        }
        false
    }

    pub fn is_m_separated(&self, x: &Node, y: &Node, z: &BTreeSet<Node>) -> bool {
        !self.is_m_connected(x, y, z)
    }

    /// Whether the directed edges of this graph contain a cycle.
    pub fn exists_directed_cycle(&self) -> bool {
        let mut indegree: BTreeMap<&Node, usize> = self.nodes().map(|n| (n, 0)).collect();
        for edge in self.edges() {
            if let Some((_, head)) = edge.directed_pair() {
                if let Some(d) = indegree.get_mut(head) {
                    *d += 1;
                }
            }
        }
        let mut queue: VecDeque<&Node> = indegree.iter().filter(|(_, d)| **d == 0).map(|(n, _)| *n).collect();
        let mut processed = 0;
        while let Some(node) = queue.pop_front() {
            processed += 1;
            for child in self.adjacent_nodes(node) {
                if !self.is_directed_from_to(node, child) {
                    continue;
                }
                if let Some(d) = indegree.get_mut(child) {
                    *d -= 1;
                    if *d == 0 {
                        queue.push_back(child);
                    }
                }
            }
        }
        processed < self.num_nodes()
    }

    /// Whether `u ⇝ w` could be oriented `u --> w`.
    pub fn is_semi_directed_step(&self, u: &Node, w: &Node) -> bool {
        match (self.endpoint(w, u), self.endpoint(u, w)) {
            (Some(at_u), Some(at_w)) => at_u != Endpoint::Arrow && at_w != Endpoint::Tail,
            _ => false,
        }
    }

    /// Whether a semi-directed path leads from `from` to `to`.
    pub fn exists_semi_directed_path(&self, from: &Node, to: &Node) -> bool {
        if from == to {
            return true;
        }
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([from]);
        while let Some(u) = queue.pop_front() {
            if !visited.insert(u) {
                continue;
            }
            for w in self.adjacent_nodes(u) {
                if !self.is_semi_directed_step(u, w) {
                    continue;
                }
                if w == to {
                    return true;
                }
                queue.push_back(w);
            }
        }
        false
    }

    /// All simple semi-directed paths from `from` to `to`.
    pub fn semi_directed_paths(&self, from: &Node, to: &Node) -> Vec<Vec<Node>> {
        self.walk_simple_paths(from, to, None, None, |prefix, next| {
            let last = &prefix[prefix.len() - 1];
            self.is_semi_directed_step(last, next)
        })
    }

    /// All treks between `x` and `y`.
    pub fn treks(&self, x: &Node, y: &Node) -> Vec<Vec<Node>> {
        self.treks_with(x, y, None, |_, _| true)
    }

    /// Treks between `x` and `y` using only edges accepted by `edge_filter`.
    ///
    /// Stops after `limit` treks when a limit is given.
    pub fn treks_with<F>(&self, x: &Node, y: &Node, limit: Option<usize>, edge_filter: F) -> Vec<Vec<Node>>
    where
        F: Fn(&Node, &Node) -> bool,
    {
        self.walk_simple_paths(x, y, None, limit, |prefix, next| {
            let cur = &prefix[prefix.len() - 1];
            if !edge_filter(cur, next) {
                return false;
            }
            match prefix.len() {
                1 => true,
                n => !self.is_def_collider(&prefix[n - 2], cur, next),
            }
        })
    }

    /// Depth-first enumeration of simple paths from `from` to `to`.
    ///
    /// `admit(prefix, next)` decides whether `prefix` may be extended by the edge to `next`.
    /// Paths have at most `max_edges` edges, and the walk stops after `limit` paths.
    pub(crate) fn walk_simple_paths<F>(
        &self,
        from: &Node,
        to: &Node,
        max_edges: Option<usize>,
        limit: Option<usize>,
        mut admit: F,
    ) -> Vec<Vec<Node>>
    where
        F: FnMut(&[Node], &Node) -> bool,
    {
        let mut found = Vec::new();
        if from == to || !self.contains(from.name()) || !self.contains(to.name()) {
            return found;
        }
        let mut stack: Vec<Vec<Node>> = vec![vec![from.clone()]];
        while let Some(prefix) = stack.pop() {
            if max_edges.is_some_and(|max| prefix.len() > max) {
                continue;
            }
            let last = &prefix[prefix.len() - 1];
            let neighbors: Vec<&Node> = self.adjacent_nodes(last).collect();
            // Reversed so that the stack yields neighbours in name order.
            for next in neighbors.into_iter().rev() {
                if prefix.contains(next) || !admit(&prefix, next) {
                    continue;
                }
                let mut path = prefix.clone();
                path.push(next.clone());
                if next == to {
                    found.push(path);
                    if limit.is_some_and(|l| found.len() >= l) {
                        return found;
                    }
                } else {
                    stack.push(path);
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::graph::Edge;

    fn nodes(names: &[&str]) -> Vec<Node> {
        names.iter().map(|n| Node::new(n)).collect()
    }

    fn set(nodes: &[&Node]) -> BTreeSet<Node> {
        nodes.iter().map(|&n| n.clone()).collect()
    }

    #[test]
    fn test_chain_separation() {
        // X --> Y --> Z
        let v = nodes(&["X", "Y", "Z"]);
        let mut g = Graph::new(v.clone());
        g.add_edge(Edge::directed(&v[0], &v[1]));
        g.add_edge(Edge::directed(&v[1], &v[2]));

        assert!(g.is_m_connected(&v[0], &v[2], &BTreeSet::new()));
        assert!(g.is_m_separated(&v[0], &v[2], &set(&[&v[1]])));
    }

    #[test]
    fn test_collider_separation() {
        // X --> Y <-- Z, Y --> W
        let v = nodes(&["W", "X", "Y", "Z"]);
        let (w, x, y, z) = (&v[0], &v[1], &v[2], &v[3]);
        let mut g = Graph::new(v.clone());
        g.add_edge(Edge::directed(x, y));
        g.add_edge(Edge::directed(z, y));
        g.add_edge(Edge::directed(y, w));

        assert!(g.is_m_separated(x, z, &BTreeSet::new()));
        assert!(g.is_m_connected(x, z, &set(&[y])));
        // Conditioning on a descendant of the collider opens it.
        assert!(g.is_m_connected(x, z, &set(&[w])));
    }

    #[test]
    fn test_circle_path_is_open() {
        let v = nodes(&["X", "Y", "Z"]);
        let mut g = Graph::new(v.clone());
        g.add_edge(Edge::nondirected(&v[0], &v[1]));
        g.add_edge(Edge::nondirected(&v[1], &v[2]));
        assert!(g.is_m_connected(&v[0], &v[2], &BTreeSet::new()));
        assert!(g.is_m_separated(&v[0], &v[2], &set(&[&v[1]])));
    }

    #[test]
    fn test_directed_cycle() {
        let v = nodes(&["A", "B", "C"]);
        let mut g = Graph::new(v.clone());
        g.add_edge(Edge::directed(&v[0], &v[1]));
        g.add_edge(Edge::directed(&v[1], &v[2]));
        assert!(!g.exists_directed_cycle());
        g.add_edge(Edge::partially_oriented(&v[2], &v[0]));
        assert!(!g.exists_directed_cycle());
        g.set_endpoint(&v[0], &v[2], Endpoint::Tail);
        assert!(g.exists_directed_cycle());
        assert!(g.is_ancestor_of(&v[0], &v[2]));
        assert!(g.is_ancestor_of(&v[2], &v[0]));
    }

    #[test]
    fn test_semi_directed_paths() {
        // A o-> B o-o C <-- D
        let v = nodes(&["A", "B", "C", "D"]);
        let (a, b, c, d) = (&v[0], &v[1], &v[2], &v[3]);
        let mut g = Graph::new(v.clone());
        g.add_edge(Edge::partially_oriented(a, b));
        g.add_edge(Edge::nondirected(b, c));
        g.add_edge(Edge::directed(d, c));

        assert!(g.exists_semi_directed_path(a, c));
        assert!(!g.exists_semi_directed_path(c, a));
        assert!(!g.exists_semi_directed_path(a, d));
        assert_eq!(g.semi_directed_paths(a, c), vec![vec![a.clone(), b.clone(), c.clone()]]);
    }

    #[test]
    fn test_treks_skip_colliders() {
        // X o-> W <-o Y and X o-o V o-o Y
        let v = nodes(&["V", "W", "X", "Y"]);
        let (vv, w, x, y) = (&v[0], &v[1], &v[2], &v[3]);
        let mut g = Graph::new(v.clone());
        g.add_edge(Edge::partially_oriented(x, w));
        g.add_edge(Edge::partially_oriented(y, w));
        g.add_edge(Edge::nondirected(x, vv));
        g.add_edge(Edge::nondirected(vv, y));

        let treks = g.treks(x, y);
        assert_eq!(treks, vec![vec![x.clone(), vv.clone(), y.clone()]]);
        assert!(g.treks_with(x, y, None, |a, b| a != vv && b != vv).is_empty());
    }

    #[test]
    fn test_walk_respects_length_and_limit() {
        // Complete graph on four nodes.
        let v = nodes(&["A", "B", "C", "D"]);
        let mut g = Graph::new(v.clone());
        for i in 0..v.len() {
            for j in (i + 1)..v.len() {
                g.add_edge(Edge::nondirected(&v[i], &v[j]));
            }
        }
        let all = g.walk_simple_paths(&v[0], &v[3], None, None, |_, _| true);
        // A-D, A-B-D, A-C-D, A-B-C-D, A-C-B-D
        assert_eq!(all.len(), 5);
        let short = g.walk_simple_paths(&v[0], &v[3], Some(2), None, |_, _| true);
        assert_eq!(short.len(), 3);
        let first = g.walk_simple_paths(&v[0], &v[3], None, Some(1), |_, _| true);
        assert_eq!(first.len(), 1);
    }
}
