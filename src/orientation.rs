//! Final orientation: circle-resolution rules run to a fixpoint.
//!
//! The rules only ever replace a [`Circle`](Endpoint::Circle) mark, so every pass either makes
//! progress or ends the branch. When a discriminating path leaves a triple undecided, the branch
//! splits in two and both children continue independently.
//!
//! Rules, for a triple `a *-* b *-* c`:
//!
//! - **double triangle**: `d *-o b`, `a *-> b <-* c`, `a` and `c` adjacent to `d`, and `<a, d, c>`
//!   not a definite collider: orient `d *-> b`;
//! - **away from collider**: `a *-> b o-* c` with `a`, `c` nonadjacent: orient `b --> c`;
//! - **away from ancestor**: `a *-o c` and either `a --> b *-> c` or `a *-> b --> c`: orient
//!   `a *-> c`;
//! - **away from cycle**: `a o-> c` and `a --> b --> c`: orient `a --> c`;
//! - **discriminating path**: see [`FinalOrientation::discriminating_path`].

use std::collections::{BTreeSet, VecDeque};

use log::{debug, trace};

use crate::facts::FactDatabase;
use crate::graph::{Endpoint, Graph, Node};
use crate::knowledge::Knowledge;

/// Work lists of the fixpoint loop.
///
/// `changed` tracks whether the branch currently being processed was modified during this pass.
#[derive(Debug, Default)]
struct FixpointState {
    changed: bool,
    active: BTreeSet<Graph>,
    next: BTreeSet<Graph>,
}

pub struct FinalOrientation<'a> {
    facts: &'a FactDatabase,
    knowledge: Option<&'a dyn Knowledge>,
}

impl<'a> FinalOrientation<'a> {
    pub fn new(facts: &'a FactDatabase, knowledge: Option<&'a dyn Knowledge>) -> Self {
        Self { facts, knowledge }
    }

    /// Runs the rules on `graph` until every branch is stable, returning the final graphs.
    pub fn orient(&self, graph: Graph) -> BTreeSet<Graph> {
        let mut state = FixpointState {
            active: BTreeSet::from([graph]),
            ..FixpointState::default()
        };
        let mut finals = BTreeSet::new();
        let mut passes = 0usize;

        while !state.active.is_empty() {
            passes += 1;
            for mut g in std::mem::take(&mut state.active) {
                state.changed = self.double_triangle(&mut g);
                state.changed |= self.away_from_collider_ancestor_cycle(&mut g);
                match self.discriminating_path(&g) {
                    Some(children) => {
                        trace!("Discriminating path split into {} branches", children.len());
                        state.next.extend(children);
                    }
                    None if state.changed => {
                        state.next.insert(g);
                    }
                    None => {
                        finals.insert(g);
                    }
                }
            }
            std::mem::swap(&mut state.active, &mut state.next);
        }
        debug!("Final orientation: {} graphs after {} passes", finals.len(), passes);
        finals
    }

    /// An arrowhead at `y` on the edge `x`–`y` is allowed unless it overwrites a tail or the
    /// knowledge requires `y --> x`.
    fn is_arrowpoint_allowed(&self, g: &Graph, x: &Node, y: &Node) -> bool {
        match g.endpoint(x, y) {
            Some(Endpoint::Arrow) => true,
            Some(Endpoint::Circle) => !self.knowledge.is_some_and(|k| k.is_required(y.name(), x.name())),
            _ => false,
        }
    }

    /// A tail at `y` on the edge `x`–`y` is allowed unless the knowledge forbids `y --> x`.
    fn is_tail_allowed(&self, g: &Graph, x: &Node, y: &Node) -> bool {
        match g.endpoint(x, y) {
            Some(Endpoint::Tail) => true,
            Some(Endpoint::Circle) => !self.knowledge.is_some_and(|k| k.is_forbidden(y.name(), x.name())),
            _ => false,
        }
    }

    /// Replaces the circle at `y` on `x`–`y` with `endpoint`, if allowed.
    fn resolve_circle(&self, g: &mut Graph, x: &Node, y: &Node, endpoint: Endpoint) -> bool {
        if g.endpoint(x, y) != Some(Endpoint::Circle) {
            return false;
        }
        let allowed = match endpoint {
            Endpoint::Arrow => self.is_arrowpoint_allowed(g, x, y),
            Endpoint::Tail => self.is_tail_allowed(g, x, y),
            Endpoint::Circle => false,
        };
        allowed && g.set_endpoint(x, y, endpoint)
    }

    fn double_triangle(&self, g: &mut Graph) -> bool {
        let mut changed = false;
        let nodes: Vec<Node> = g.nodes().cloned().collect();
        for b in &nodes {
            let arrows = g.nodes_into(b, Endpoint::Arrow);
            for d in g.nodes_into(b, Endpoint::Circle) {
                let fires = arrows.iter().any(|a| {
                    arrows.iter().any(|c| {
                        a != c && g.is_adjacent(a, &d) && g.is_adjacent(c, &d) && !g.is_def_collider(a, &d, c)
                    })
                });
                if fires && self.resolve_circle(g, &d, b, Endpoint::Arrow) {
                    trace!("Double triangle: {} *-> {}", d, b);
                    changed = true;
                }
            }
        }
        changed
    }

    fn away_from_collider_ancestor_cycle(&self, g: &mut Graph) -> bool {
        let mut changed = false;
        let nodes: Vec<Node> = g.nodes().cloned().collect();
        for b in &nodes {
            let adj: Vec<Node> = g.adjacent_nodes(b).cloned().collect();
            for i in 0..adj.len() {
                for j in (i + 1)..adj.len() {
                    let (a, c) = (&adj[i], &adj[j]);
                    changed |= self.away_from_collider(g, a, b, c);
                    changed |= self.away_from_collider(g, c, b, a);
                    changed |= self.away_from_ancestor(g, a, b, c);
                    changed |= self.away_from_ancestor(g, c, b, a);
                    changed |= self.away_from_cycle(g, a, b, c);
                    changed |= self.away_from_cycle(g, c, b, a);
                }
            }
        }
        changed
    }

    fn away_from_collider(&self, g: &mut Graph, a: &Node, b: &Node, c: &Node) -> bool {
        if g.is_adjacent(a, c) || g.endpoint(a, b) != Some(Endpoint::Arrow) {
            return false;
        }
        let (Some(at_c), Some(at_b)) = (g.endpoint(b, c), g.endpoint(c, b)) else {
            return false;
        };
        let mut changed = false;
        if matches!(at_b, Endpoint::Circle | Endpoint::Tail) && at_c == Endpoint::Circle {
            changed |= self.resolve_circle(g, b, c, Endpoint::Arrow);
        }
        if matches!(at_c, Endpoint::Circle | Endpoint::Arrow) && at_b == Endpoint::Circle {
            changed |= self.resolve_circle(g, c, b, Endpoint::Tail);
        }
        changed
    }

    fn away_from_ancestor(&self, g: &mut Graph, a: &Node, b: &Node, c: &Node) -> bool {
        if g.endpoint(a, c) != Some(Endpoint::Circle) {
            return false;
        }
        let through_b = g.endpoint(a, b) == Some(Endpoint::Arrow)
            && g.endpoint(b, c) == Some(Endpoint::Arrow)
            && (g.endpoint(b, a) == Some(Endpoint::Tail) || g.endpoint(c, b) == Some(Endpoint::Tail));
        through_b && self.resolve_circle(g, a, c, Endpoint::Arrow)
    }

    fn away_from_cycle(&self, g: &mut Graph, a: &Node, b: &Node, c: &Node) -> bool {
        if g.endpoint(a, c) != Some(Endpoint::Arrow) || g.endpoint(c, a) != Some(Endpoint::Circle) {
            return false;
        }
        g.is_directed_from_to(a, b) && g.is_directed_from_to(b, c) && self.resolve_circle(g, c, a, Endpoint::Tail)
    }

    /// Looks for a discriminating path for some triple `<a, b, c>` with `b o-> c` and `a` a parent
    /// of `c`, and orients it.
    ///
    /// The path runs from an endpoint `l`, not adjacent to `c`, through colliders that are all
    /// parents of `c`, into `a`. If a separation of `l` and `c` conditions on `b`, then `b` is a
    /// noncollider and `c *-- b`. Otherwise both readings are possible and two children are
    /// returned: one with `a *-> b <-* c`, one with `c *-- b`.
    ///
    /// Returns `None` if no discriminating path exists.
    pub fn discriminating_path(&self, g: &Graph) -> Option<Vec<Graph>> {
        for b in g.nodes() {
            let poss_ac = g.nodes_out_of(b, Endpoint::Arrow);
            let poss_a: Vec<&Node> = poss_ac
                .iter()
                .filter(|x| g.endpoint(x, b) != Some(Endpoint::Tail))
                .collect();
            let poss_c: Vec<&Node> = poss_ac
                .iter()
                .filter(|x| g.endpoint(x, b) == Some(Endpoint::Circle))
                .collect();
            for &a in &poss_a {
                for &c in &poss_c {
                    if a == c || !g.is_parent_of(a, c) {
                        continue;
                    }
                    if let Some(l) = find_discriminating_endpoint(g, a, b, c) {
                        return Some(self.orient_discriminated(g, &l, a, b, c));
                    }
                }
            }
        }
        None
    }

    fn orient_discriminated(&self, g: &Graph, l: &Node, a: &Node, b: &Node, c: &Node) -> Vec<Graph> {
        let noncollider = self
            .facts
            .separation(l, c)
            .is_some_and(|fact| fact.conditioning_sets().any(|z| z.contains(b)));
        let mut children = Vec::with_capacity(2);
        if noncollider {
            trace!("Discriminating path from {}: {} *-- {}", l, c, b);
            if self.is_tail_allowed(g, c, b) {
                let mut child = g.clone();
                child.set_endpoint(c, b, Endpoint::Tail);
                children.push(child);
            } else {
                debug!("Dropping branch: knowledge forbids the noncollider at {} on <{}, {}, {}>", b, a, b, c);
            }
            return children;
        }

        if self.is_arrowpoint_allowed(g, a, b) && self.is_arrowpoint_allowed(g, c, b) {
            let mut collider = g.clone();
            collider.set_endpoint(a, b, Endpoint::Arrow);
            collider.set_endpoint(c, b, Endpoint::Arrow);
            children.push(collider);
        }
        if self.is_tail_allowed(g, c, b) {
            let mut tail = g.clone();
            tail.set_endpoint(c, b, Endpoint::Tail);
            children.push(tail);
        }
        if children.is_empty() {
            debug!("Dropping branch: knowledge rules out both readings of <{}, {}, {}>", a, b, c);
        }
        children
    }
}

/// Breadth-first search back from `a` along collider paths whose nodes are parents of `c`.
///
/// Returns the first node reached that is not adjacent to `c`.
fn find_discriminating_endpoint(g: &Graph, a: &Node, b: &Node, c: &Node) -> Option<Node> {
    let c_parents: BTreeSet<Node> = g.parents(c).into_iter().collect();
    let mut visited: BTreeSet<Node> = BTreeSet::from([b.clone(), c.clone()]);
    let mut reachable = VecDeque::from([a.clone()]);

    while let Some(x) = reachable.pop_front() {
        visited.insert(x.clone());
        for l in g.nodes_into(&x, Endpoint::Arrow) {
            if visited.contains(&l) {
                continue;
            }
            if !g.is_adjacent(&l, c) {
                return Some(l);
            }
            if c_parents.contains(&l) && g.endpoint(&x, &l) == Some(Endpoint::Arrow) {
                reachable.push_back(l);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::graph::Edge;
    use crate::knowledge::BackgroundKnowledge;

    fn nodes(names: &[&str]) -> Vec<Node> {
        names.iter().map(|n| Node::new(n)).collect()
    }

    #[test]
    fn test_away_from_collider() {
        // A *-> B o-o C, A and C nonadjacent: B --> C
        let v = nodes(&["A", "B", "C"]);
        let (a, b, c) = (&v[0], &v[1], &v[2]);
        let mut g = Graph::new(v.clone());
        g.add_edge(Edge::partially_oriented(a, b));
        g.add_edge(Edge::nondirected(b, c));

        let facts = FactDatabase::new();
        let result = FinalOrientation::new(&facts, None).orient(g);
        assert_eq!(result.len(), 1);
        let g = result.first().unwrap();
        assert!(g.is_directed_from_to(b, c));
        assert_eq!(g.endpoint(b, a), Some(Endpoint::Circle));
    }

    #[test]
    fn test_away_from_collider_respects_knowledge() {
        let v = nodes(&["A", "B", "C"]);
        let (a, b, c) = (&v[0], &v[1], &v[2]);
        let mut g = Graph::new(v.clone());
        g.add_edge(Edge::partially_oriented(a, b));
        g.add_edge(Edge::nondirected(b, c));

        let mut k = BackgroundKnowledge::new();
        k.set_forbidden("B", "C");
        let facts = FactDatabase::new();
        let result = FinalOrientation::new(&facts, Some(&k)).orient(g);
        let g = result.first().unwrap();
        // The arrowhead at C is placed, the tail at B is not.
        assert_eq!(g.endpoint(b, c), Some(Endpoint::Arrow));
        assert_eq!(g.endpoint(c, b), Some(Endpoint::Circle));
    }

    #[test]
    fn test_away_from_ancestor() {
        // A --> B --> C and A o-o C: A *-> C
        let v = nodes(&["A", "B", "C"]);
        let (a, b, c) = (&v[0], &v[1], &v[2]);
        let mut g = Graph::new(v.clone());
        g.add_edge(Edge::directed(a, b));
        g.add_edge(Edge::directed(b, c));
        g.add_edge(Edge::nondirected(a, c));

        let facts = FactDatabase::new();
        let result = FinalOrientation::new(&facts, None).orient(g);
        let g = result.first().unwrap();
        assert_eq!(g.endpoint(a, c), Some(Endpoint::Arrow));
        // ...and then away from cycle: A --> C.
        assert!(g.is_directed_from_to(a, c));
    }

    #[test]
    fn test_double_triangle() {
        // A --> B <-- C, A o-o D o-o C, D o-o B: D *-> B
        let v = nodes(&["A", "B", "C", "D"]);
        let (a, b, c, d) = (&v[0], &v[1], &v[2], &v[3]);
        let mut g = Graph::new(v.clone());
        g.add_edge(Edge::directed(a, b));
        g.add_edge(Edge::directed(c, b));
        g.add_edge(Edge::nondirected(a, d));
        g.add_edge(Edge::nondirected(c, d));
        g.add_edge(Edge::nondirected(d, b));

        let facts = FactDatabase::new();
        let orienter = FinalOrientation::new(&facts, None);
        let mut h = g.clone();
        assert!(orienter.double_triangle(&mut h));
        assert_eq!(h.endpoint(d, b), Some(Endpoint::Arrow));
        assert!(!orienter.double_triangle(&mut h));
    }

    fn discriminating_graph() -> (Graph, Vec<Node>) {
        // L *-> A <-> B o-o C, A --> C, B o-> ... with L not adjacent to C.
        //
        //      B
        //     ^ o
        //    /   \
        // L -> A --> C, A <-> B, L --> C missing
        let v = nodes(&["A", "B", "C", "L"]);
        let (a, b, c, l) = (&v[0], &v[1], &v[2], &v[3]);
        let mut g = Graph::new(v.clone());
        g.add_edge(Edge::directed(l, a));
        g.add_edge(Edge::bidirected(a, b));
        g.add_edge(Edge::directed(a, c));
        g.add_edge(Edge::partially_oriented(b, c));
        (g, v)
    }

    #[test]
    fn test_discriminating_path_branches() {
        let (g, v) = discriminating_graph();
        let (b, c) = (&v[1], &v[2]);
        let facts = FactDatabase::new();
        let orienter = FinalOrientation::new(&facts, None);

        let children = orienter.discriminating_path(&g).unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].endpoint(c, b), Some(Endpoint::Arrow));
        assert_eq!(children[1].endpoint(c, b), Some(Endpoint::Tail));
    }

    #[test]
    fn test_discriminating_path_uses_separation() {
        let (g, v) = discriminating_graph();
        let (a, b, c, l) = (&v[0], &v[1], &v[2], &v[3]);
        let mut facts = FactDatabase::new();
        facts.add_separation(l, c, [a.clone(), b.clone()].into_iter().collect());
        let orienter = FinalOrientation::new(&facts, None);

        let children = orienter.discriminating_path(&g).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].endpoint(c, b), Some(Endpoint::Tail));

        let result = orienter.orient(g);
        assert_eq!(result.len(), 1);
        assert!(result.first().unwrap().is_directed_from_to(b, c));
    }

    #[test]
    fn test_discriminating_path_noncollider_respects_knowledge() {
        let (g, v) = discriminating_graph();
        let (a, b, c, l) = (&v[0], &v[1], &v[2], &v[3]);
        let mut facts = FactDatabase::new();
        facts.add_separation(l, c, [a.clone(), b.clone()].into_iter().collect());
        let mut k = BackgroundKnowledge::new();
        k.set_forbidden("B", "C");
        let orienter = FinalOrientation::new(&facts, Some(&k));

        assert_eq!(orienter.discriminating_path(&g), Some(Vec::new()));
        assert!(orienter.orient(g).is_empty());
    }

    #[test]
    fn test_no_discriminating_path() {
        let v = nodes(&["A", "B"]);
        let mut g = Graph::new(v.clone());
        g.add_edge(Edge::nondirected(&v[0], &v[1]));
        let facts = FactDatabase::new();
        let orienter = FinalOrientation::new(&facts, None);
        assert!(orienter.discriminating_path(&g).is_none());
        assert_eq!(orienter.orient(g.clone()), BTreeSet::from([g]));
    }
}
