//! Minimal graph edits that destroy a possibly connecting path.

use std::collections::BTreeSet;
use std::fmt;

use crate::graph::{Endpoint, Graph, Node, NodePair, Triple};

/// Arrowhead to put at `to` on the edge `from`–`to`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Orientation {
    from: Node,
    to: Node,
}

impl Orientation {
    pub fn new(from: &Node, to: &Node) -> Self {
        Self {
            from: from.clone(),
            to: to.clone(),
        }
    }

    pub fn from(&self) -> &Node {
        &self.from
    }

    pub fn to(&self) -> &Node {
        &self.to
    }
}

/// A set of edge removals, forced colliders, forced noncolliders and forced arrowheads.
///
/// Changes are values: combining and applying them never mutates the graph they are applied to.
#[derive(Debug, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct GraphChange {
    removes: BTreeSet<NodePair>,
    colliders: BTreeSet<Triple>,
    noncolliders: BTreeSet<Triple>,
    orients: BTreeSet<Orientation>,
}

impl GraphChange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes the edge `a`–`b`.
    pub fn removing(a: &Node, b: &Node) -> Self {
        let mut change = Self::new();
        change.add_remove(a, b);
        change
    }

    pub fn collider(triple: Triple) -> Self {
        let mut change = Self::new();
        change.colliders.insert(triple);
        change
    }

    pub fn noncollider(triple: Triple) -> Self {
        let mut change = Self::new();
        change.noncolliders.insert(triple);
        change
    }

    pub fn add_remove(&mut self, a: &Node, b: &Node) -> bool {
        self.removes.insert(NodePair::new(a, b))
    }

    pub fn add_collider(&mut self, triple: Triple) -> bool {
        self.colliders.insert(triple)
    }

    pub fn add_noncollider(&mut self, triple: Triple) -> bool {
        self.noncolliders.insert(triple)
    }

    pub fn add_orient(&mut self, from: &Node, to: &Node) -> bool {
        self.orients.insert(Orientation::new(from, to))
    }

    pub fn removes(&self) -> impl Iterator<Item = &NodePair> + '_ {
        self.removes.iter()
    }

    pub fn colliders(&self) -> impl Iterator<Item = &Triple> + '_ {
        self.colliders.iter()
    }

    pub fn noncolliders(&self) -> impl Iterator<Item = &Triple> + '_ {
        self.noncolliders.iter()
    }

    pub fn orients(&self) -> impl Iterator<Item = &Orientation> + '_ {
        self.orients.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.removes.is_empty() && self.colliders.is_empty() && self.noncolliders.is_empty() && self.orients.is_empty()
    }

    /// Adds every edit of `other` to this change.
    pub fn union_with(&mut self, other: &GraphChange) {
        self.removes.extend(other.removes.iter().cloned());
        self.colliders.extend(other.colliders.iter().cloned());
        self.noncolliders.extend(other.noncolliders.iter().cloned());
        self.orients.extend(other.orients.iter().cloned());
    }

    /// Union of several changes.
    pub fn merged<'a>(changes: impl IntoIterator<Item = &'a GraphChange>) -> Self {
        let mut result = Self::new();
        for change in changes {
            result.union_with(change);
        }
        result
    }

    /// Whether the edits agree with each other.
    ///
    /// A triple may not be both a collider and a noncollider, an edge of a classified triple may
    /// not be removed, and an edge may not be both removed and oriented.
    pub fn is_consistent(&self) -> bool {
        if !self.colliders.is_disjoint(&self.noncolliders) {
            return false;
        }
        for pair in &self.removes {
            let (a, b) = (pair.first(), pair.second());
            if self.colliders.iter().chain(&self.noncolliders).any(|t| t.has_edge(a, b)) {
                return false;
            }
            if self.orients.iter().any(|o| pair.contains(&o.from) && pair.contains(&o.to)) {
                return false;
            }
        }
        true
    }

    /// Whether the edits agree with each other and with the marks already in `graph`.
    ///
    /// An arrowhead may not be forced into the middle of a noncollider whose other edge already
    /// has an arrowhead there.
    pub fn is_consistent_with(&self, graph: &Graph) -> bool {
        if !self.is_consistent() {
            return false;
        }
        for o in &self.orients {
            for t in &self.noncolliders {
                if *t.y() != o.to {
                    continue;
                }
                let other = if *t.x() == o.from {
                    t.z()
                } else if *t.z() == o.from {
                    t.x()
                } else {
                    continue;
                };
                if graph.endpoint(other, t.y()) == Some(Endpoint::Arrow) {
                    return false;
                }
            }
        }
        true
    }

    /// Applies the edits to a copy of `graph`.
    ///
    /// Returns `None` when an edit does not apply: the edge to remove or orient is missing, an
    /// arrowhead would overwrite a tail, a collider would land on an underlined triple, or a
    /// noncollider on a definite collider.
    pub fn apply_to(&self, graph: &Graph) -> Option<Graph> {
        let mut g = graph.clone();
        for pair in &self.removes {
            g.remove_edge(pair.first(), pair.second())?;
        }
        for t in &self.colliders {
            if g.is_underline(t.x(), t.y(), t.z()) {
                return None;
            }
            force_arrowhead(&mut g, t.x(), t.y())?;
            force_arrowhead(&mut g, t.z(), t.y())?;
        }
        for t in &self.noncolliders {
            if !g.is_along_path(t.x(), t.y(), t.z()) || g.is_def_collider(t.x(), t.y(), t.z()) {
                return None;
            }
            g.add_underline(t.x(), t.y(), t.z());
        }
        for o in &self.orients {
            force_arrowhead(&mut g, &o.from, &o.to)?;
        }
        Some(g)
    }
}

fn force_arrowhead(g: &mut Graph, from: &Node, into: &Node) -> Option<()> {
    match g.endpoint(from, into)? {
        Endpoint::Tail => None,
        _ => {
            g.set_endpoint(from, into, Endpoint::Arrow);
            Some(())
        }
    }
}

impl fmt::Display for GraphChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        for pair in &self.removes {
            parts.push(format!("remove {}", pair));
        }
        for t in &self.colliders {
            parts.push(format!("collider {}", t));
        }
        for t in &self.noncolliders {
            parts.push(format!("noncollider {}", t));
        }
        for o in &self.orients {
            parts.push(format!("orient {} *-> {}", o.from, o.to));
        }
        write!(f, "[{}]", parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::graph::Edge;

    fn chain() -> (Graph, Node, Node, Node) {
        // X o-o Y o-o Z
        let (x, y, z) = (Node::new("X"), Node::new("Y"), Node::new("Z"));
        let mut g = Graph::new([x.clone(), y.clone(), z.clone()]);
        g.add_edge(Edge::nondirected(&x, &y));
        g.add_edge(Edge::nondirected(&y, &z));
        (g, x, y, z)
    }

    #[test]
    fn test_apply_remove() {
        let (g, x, y, _) = chain();
        let changed = GraphChange::removing(&y, &x).apply_to(&g).unwrap();
        assert!(!changed.is_adjacent(&x, &y));
        assert!(g.is_adjacent(&x, &y));
        assert!(GraphChange::removing(&x, &Node::new("Z")).apply_to(&g).is_none());
    }

    #[test]
    fn test_apply_collider_and_noncollider() {
        let (g, x, y, z) = chain();
        let collided = GraphChange::collider(Triple::new(&x, &y, &z)).apply_to(&g).unwrap();
        assert!(collided.is_def_collider(&x, &y, &z));
        assert_eq!(collided.endpoint(&y, &x), Some(Endpoint::Circle));

        let underlined = GraphChange::noncollider(Triple::new(&x, &y, &z)).apply_to(&g).unwrap();
        assert!(underlined.is_underline(&x, &y, &z));
        assert!(GraphChange::collider(Triple::new(&x, &y, &z)).apply_to(&underlined).is_none());
        assert!(GraphChange::noncollider(Triple::new(&x, &y, &z)).apply_to(&collided).is_none());
    }

    #[test]
    fn test_arrow_over_tail_is_inapplicable() {
        let (mut g, x, y, z) = chain();
        g.set_endpoint(&x, &y, Endpoint::Tail);
        assert!(GraphChange::collider(Triple::new(&x, &y, &z)).apply_to(&g).is_none());
        let mut change = GraphChange::new();
        change.add_orient(&z, &y);
        assert!(change.apply_to(&g).unwrap().endpoint(&z, &y) == Some(Endpoint::Arrow));
    }

    #[test]
    fn test_consistency() {
        let (g, x, y, z) = chain();
        let t = Triple::new(&x, &y, &z);

        let both = GraphChange::merged([&GraphChange::collider(t.clone()), &GraphChange::noncollider(t.clone())]);
        assert!(!both.is_consistent());

        let removes_own_edge = GraphChange::merged([&GraphChange::collider(t.clone()), &GraphChange::removing(&y, &z)]);
        assert!(!removes_own_edge.is_consistent());

        let mut remove_and_orient = GraphChange::removing(&x, &y);
        remove_and_orient.add_orient(&y, &x);
        assert!(!remove_and_orient.is_consistent());

        let mut fine = GraphChange::removing(&x, &y);
        fine.add_orient(&z, &y);
        assert!(fine.is_consistent());
        assert!(fine.is_consistent_with(&g));
    }

    #[test]
    fn test_orient_into_noncollider_midpoint() {
        let (mut g, x, y, z) = chain();
        g.set_endpoint(&x, &y, Endpoint::Arrow);
        let mut change = GraphChange::noncollider(Triple::new(&x, &y, &z));
        change.add_orient(&z, &y);
        assert!(change.is_consistent());
        assert!(!change.is_consistent_with(&g));
    }

    #[test]
    fn test_display() {
        let (_, x, y, z) = chain();
        let mut change = GraphChange::removing(&x, &y);
        change.add_orient(&z, &y);
        assert_eq!(change.to_string(), "[remove {X, Y}; orient Z *-> Y]");
    }
}
