//! Partial ancestral graphs over named variables.
//!
//! A [`Graph`] is a set of [`Node`]s connected by edges whose two endpoints carry independent
//! [`Endpoint`] marks. Nodes are identified by name only: two graphs built from different inputs
//! agree on a variable whenever the names agree, so every lookup goes through the name.
//!
//! # Endpoint convention
//!
//! [`Graph::endpoint(a, b)`][Graph::endpoint] returns the mark **at `b`** on the edge `a`–`b`.
//! With this convention:
//!
//! - `a --> b` has `endpoint(a, b) == Arrow` and `endpoint(b, a) == Tail`,
//! - `a o-> b` has `endpoint(a, b) == Arrow` and `endpoint(b, a) == Circle`,
//! - `a <-> b` has both marks equal to `Arrow`.
//!
//! # Example
//!
//! ```
//! use ion_rs::graph::{Edge, Endpoint, Graph, Node};
//!
//! let (a, b) = (Node::new("A"), Node::new("B"));
//! let mut g = Graph::new([a.clone(), b.clone()]);
//! g.add_edge(Edge::partially_oriented(&a, &b));
//!
//! assert_eq!(g.endpoint(&a, &b), Some(Endpoint::Arrow));
//! assert_eq!(g.endpoint(&b, &a), Some(Endpoint::Circle));
//! assert_eq!(g.edge(&b, &a).unwrap().to_string(), "A o-> B");
//! ```

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Kind of variable a node stands for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub enum NodeType {
    #[default]
    Measured,
    Latent,
}

/// A named variable.
///
/// Equality, ordering and hashing look at the name only, so a node taken from one graph can be
/// used to query any other graph that has a variable of the same name.
#[derive(Debug, Clone)]
pub struct Node {
    name: Arc<str>,
    node_type: NodeType,
}

impl Node {
    /// Creates a measured variable.
    pub fn new(name: &str) -> Self {
        Self::with_type(name, NodeType::Measured)
    }

    /// Creates a latent variable.
    pub fn latent(name: &str) -> Self {
        Self::with_type(name, NodeType::Latent)
    }

    pub fn with_type(name: &str, node_type: NodeType) -> Self {
        assert!(!name.is_empty(), "Node names must be non-empty");
        Self {
            name: Arc::from(name),
            node_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Node {}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Borrow<str> for Node {
    fn borrow(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Endpoint mark of an edge.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Endpoint {
    Tail,
    Arrow,
    /// Orientation unknown.
    Circle,
}

impl Endpoint {
    fn left_symbol(self) -> char {
        match self {
            Endpoint::Tail => '-',
            Endpoint::Arrow => '<',
            Endpoint::Circle => 'o',
        }
    }

    fn right_symbol(self) -> char {
        match self {
            Endpoint::Tail => '-',
            Endpoint::Arrow => '>',
            Endpoint::Circle => 'o',
        }
    }
}

/// An edge with one mark per side, stored with `node1 < node2`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Edge {
    node1: Node,
    node2: Node,
    endpoint1: Endpoint,
    endpoint2: Endpoint,
}

impl Edge {
    /// Creates an edge with `endpoint1` at `node1` and `endpoint2` at `node2`.
    ///
    /// # Panics
    ///
    /// Panics on a self-loop.
    pub fn new(node1: &Node, node2: &Node, endpoint1: Endpoint, endpoint2: Endpoint) -> Self {
        assert_ne!(node1, node2, "Self-loops are not allowed");
        if node1 < node2 {
            Self {
                node1: node1.clone(),
                node2: node2.clone(),
                endpoint1,
                endpoint2,
            }
        } else {
            Self {
                node1: node2.clone(),
                node2: node1.clone(),
                endpoint1: endpoint2,
                endpoint2: endpoint1,
            }
        }
    }

    /// `a o-o b`
    pub fn nondirected(a: &Node, b: &Node) -> Self {
        Self::new(a, b, Endpoint::Circle, Endpoint::Circle)
    }

    /// `a --> b`
    pub fn directed(a: &Node, b: &Node) -> Self {
        Self::new(a, b, Endpoint::Tail, Endpoint::Arrow)
    }

    /// `a o-> b`
    pub fn partially_oriented(a: &Node, b: &Node) -> Self {
        Self::new(a, b, Endpoint::Circle, Endpoint::Arrow)
    }

    /// `a <-> b`
    pub fn bidirected(a: &Node, b: &Node) -> Self {
        Self::new(a, b, Endpoint::Arrow, Endpoint::Arrow)
    }

    pub fn node1(&self) -> &Node {
        &self.node1
    }
    pub fn node2(&self) -> &Node {
        &self.node2
    }
    pub fn endpoint1(&self) -> Endpoint {
        self.endpoint1
    }
    pub fn endpoint2(&self) -> Endpoint {
        self.endpoint2
    }

    /// Mark at `node`, if `node` is one of the two ends.
    pub fn proximal_endpoint(&self, node: &Node) -> Option<Endpoint> {
        if *node == self.node1 {
            Some(self.endpoint1)
        } else if *node == self.node2 {
            Some(self.endpoint2)
        } else {
            None
        }
    }

    /// Mark at the end opposite to `node`.
    pub fn distal_endpoint(&self, node: &Node) -> Option<Endpoint> {
        if *node == self.node1 {
            Some(self.endpoint2)
        } else if *node == self.node2 {
            Some(self.endpoint1)
        } else {
            None
        }
    }

    /// The end opposite to `node`.
    pub fn traverse(&self, node: &Node) -> Option<&Node> {
        if *node == self.node1 {
            Some(&self.node2)
        } else if *node == self.node2 {
            Some(&self.node1)
        } else {
            None
        }
    }

    /// Returns `(tail, head)` if this is a directed edge.
    pub fn directed_pair(&self) -> Option<(&Node, &Node)> {
        match (self.endpoint1, self.endpoint2) {
            (Endpoint::Tail, Endpoint::Arrow) => Some((&self.node1, &self.node2)),
            (Endpoint::Arrow, Endpoint::Tail) => Some((&self.node2, &self.node1)),
            _ => None,
        }
    }

    /// Returns `(circle side, head)` if this is a `o->` edge.
    pub fn partially_oriented_pair(&self) -> Option<(&Node, &Node)> {
        match (self.endpoint1, self.endpoint2) {
            (Endpoint::Circle, Endpoint::Arrow) => Some((&self.node1, &self.node2)),
            (Endpoint::Arrow, Endpoint::Circle) => Some((&self.node2, &self.node1)),
            _ => None,
        }
    }

    pub fn pair(&self) -> NodePair {
        NodePair::new(&self.node1, &self.node2)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{} {}",
            self.node1,
            self.endpoint1.left_symbol(),
            self.endpoint2.right_symbol(),
            self.node2
        )
    }
}

/// Unordered pair of nodes, stored with `first <= second`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodePair {
    first: Node,
    second: Node,
}

impl NodePair {
    pub fn new(a: &Node, b: &Node) -> Self {
        if a <= b {
            Self {
                first: a.clone(),
                second: b.clone(),
            }
        } else {
            Self {
                first: b.clone(),
                second: a.clone(),
            }
        }
    }

    pub fn first(&self) -> &Node {
        &self.first
    }
    pub fn second(&self) -> &Node {
        &self.second
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.first == *node || self.second == *node
    }
}

impl fmt::Display for NodePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}}}", self.first, self.second)
    }
}

/// Three nodes `(x, y, z)` with `y` in the middle.
///
/// `(x, y, z)` and `(z, y, x)` denote the same triple; it is stored with `x <= z`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Triple {
    x: Node,
    y: Node,
    z: Node,
}

impl Triple {
    pub fn new(x: &Node, y: &Node, z: &Node) -> Self {
        let (x, z) = if x <= z { (x, z) } else { (z, x) };
        Self {
            x: x.clone(),
            y: y.clone(),
            z: z.clone(),
        }
    }

    pub fn x(&self) -> &Node {
        &self.x
    }
    pub fn y(&self) -> &Node {
        &self.y
    }
    pub fn z(&self) -> &Node {
        &self.z
    }

    /// Whether `a`–`b` is one of the two edges of this triple.
    pub fn has_edge(&self, a: &Node, b: &Node) -> bool {
        (self.y == *a && (self.x == *b || self.z == *b)) || (self.y == *b && (self.x == *a || self.z == *a))
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}, {}>", self.x, self.y, self.z)
    }
}

/// A graph with per-endpoint marks and underlined (definite noncollider) triples.
///
/// All containers are ordered, so iteration order, equality and hashing are canonical: two graphs
/// with the same nodes, marks and underlines are equal no matter how they were built.
#[derive(Debug, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Graph {
    nodes: BTreeSet<Node>,
    /// `marks[a][b]` is the endpoint at `b` on the edge `a`–`b`.
    marks: BTreeMap<Node, BTreeMap<Node, Endpoint>>,
    underlines: BTreeSet<Triple>,
}

impl Graph {
    /// Creates a graph over `nodes` with no edges.
    pub fn new(nodes: impl IntoIterator<Item = Node>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
            marks: BTreeMap::new(),
            underlines: BTreeSet::new(),
        }
    }

    pub fn add_node(&mut self, node: Node) -> bool {
        self.nodes.insert(node)
    }

    /// Resolves a node by name.
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains(name)
    }

    /// Nodes in name order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter()
    }

    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name()).collect()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.marks.values().map(|m| m.len()).sum::<usize>() / 2
    }

    /// Adds `edge`, re-resolving both ends by name.
    ///
    /// Returns `false` if the two nodes are already adjacent.
    ///
    /// # Panics
    ///
    /// Panics if either end is not a node of this graph.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        let node1 = self.resolve(edge.node1());
        let node2 = self.resolve(edge.node2());
        if self.is_adjacent(&node1, &node2) {
            return false;
        }
        self.marks
            .entry(node1.clone())
            .or_default()
            .insert(node2.clone(), edge.endpoint2());
        self.marks.entry(node2).or_default().insert(node1, edge.endpoint1());
        true
    }

    fn resolve(&self, node: &Node) -> Node {
        match self.nodes.get(node.name()) {
            Some(n) => n.clone(),
            None => panic!("Node {} is not in the graph", node),
        }
    }

    /// Removes the edge `a`–`b` along with every underline that runs through it.
    pub fn remove_edge(&mut self, a: &Node, b: &Node) -> Option<Edge> {
        let edge = self.edge(a, b)?;
        for (from, to) in [(a, b), (b, a)] {
            if let Some(m) = self.marks.get_mut(from) {
                m.remove(to);
                if m.is_empty() {
                    self.marks.remove(from);
                }
            }
        }
        self.underlines.retain(|t| !t.has_edge(a, b));
        Some(edge)
    }

    pub fn is_adjacent(&self, a: &Node, b: &Node) -> bool {
        self.marks.get(a).is_some_and(|m| m.contains_key(b))
    }

    /// Mark at `b` on the edge `a`–`b`.
    pub fn endpoint(&self, a: &Node, b: &Node) -> Option<Endpoint> {
        self.marks.get(a).and_then(|m| m.get(b)).copied()
    }

    /// Sets the mark at `b` on the edge `a`–`b`. Returns `false` if there is no such edge.
    pub fn set_endpoint(&mut self, a: &Node, b: &Node, endpoint: Endpoint) -> bool {
        match self.marks.get_mut(a).and_then(|m| m.get_mut(b)) {
            Some(mark) => {
                *mark = endpoint;
                true
            }
            None => false,
        }
    }

    pub fn edge(&self, a: &Node, b: &Node) -> Option<Edge> {
        let at_b = self.endpoint(a, b)?;
        let at_a = self.endpoint(b, a)?;
        Some(Edge::new(a, b, at_a, at_b))
    }

    /// Edges in canonical order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.marks.iter().flat_map(move |(a, m)| {
            m.iter()
                .filter(move |(b, _)| a < *b)
                .map(move |(b, &at_b)| Edge::new(a, b, self.endpoint(b, a).unwrap_or(Endpoint::Circle), at_b))
        })
    }

    /// Neighbours of `node` in name order.
    pub fn adjacent_nodes<'a>(&'a self, node: &Node) -> impl Iterator<Item = &'a Node> + 'a {
        self.marks.get(node).into_iter().flat_map(|m| m.keys())
    }

    pub fn degree(&self, node: &Node) -> usize {
        self.marks.get(node).map_or(0, |m| m.len())
    }

    /// Neighbours `a` whose edge has mark `endpoint` at `node` (`a *-e node`).
    pub fn nodes_into(&self, node: &Node, endpoint: Endpoint) -> Vec<Node> {
        self.adjacent_nodes(node)
            .filter(|a| self.endpoint(a, node) == Some(endpoint))
            .cloned()
            .collect()
    }

    /// Neighbours `a` whose edge has mark `endpoint` at `a` (`node *-e a`).
    pub fn nodes_out_of(&self, node: &Node, endpoint: Endpoint) -> Vec<Node> {
        self.adjacent_nodes(node)
            .filter(|a| self.endpoint(node, a) == Some(endpoint))
            .cloned()
            .collect()
    }

    /// `a --> b`
    pub fn is_directed_from_to(&self, a: &Node, b: &Node) -> bool {
        self.endpoint(a, b) == Some(Endpoint::Arrow) && self.endpoint(b, a) == Some(Endpoint::Tail)
    }

    pub fn is_parent_of(&self, a: &Node, b: &Node) -> bool {
        self.is_directed_from_to(a, b)
    }

    pub fn parents(&self, node: &Node) -> Vec<Node> {
        self.adjacent_nodes(node)
            .filter(|a| self.is_directed_from_to(a, node))
            .cloned()
            .collect()
    }

    pub fn children(&self, node: &Node) -> Vec<Node> {
        self.adjacent_nodes(node)
            .filter(|b| self.is_directed_from_to(node, b))
            .cloned()
            .collect()
    }

    /// `a *-> b <-* c`
    pub fn is_def_collider(&self, a: &Node, b: &Node, c: &Node) -> bool {
        self.endpoint(a, b) == Some(Endpoint::Arrow) && self.endpoint(c, b) == Some(Endpoint::Arrow)
    }

    /// Underlined, or `b` has a tail toward `a` or `c`.
    pub fn is_def_noncollider(&self, a: &Node, b: &Node, c: &Node) -> bool {
        self.is_underline(a, b, c)
            || self.endpoint(a, b) == Some(Endpoint::Tail)
            || self.endpoint(c, b) == Some(Endpoint::Tail)
    }

    /// `a`–`b`–`c` is a path in this graph.
    pub fn is_along_path(&self, a: &Node, b: &Node, c: &Node) -> bool {
        a != c && self.is_adjacent(a, b) && self.is_adjacent(b, c)
    }

    pub fn add_underline(&mut self, a: &Node, b: &Node, c: &Node) -> bool {
        self.underlines.insert(Triple::new(a, b, c))
    }

    pub fn is_underline(&self, a: &Node, b: &Node, c: &Node) -> bool {
        self.underlines.contains(&Triple::new(a, b, c))
    }

    pub fn underlines(&self) -> impl Iterator<Item = &Triple> + '_ {
        self.underlines.iter()
    }

    pub fn clear_underlines(&mut self) {
        self.underlines.clear();
    }

    /// Every triple `(x, y, z)` with both `x` and `z` adjacent to `y`.
    pub fn triples(&self) -> BTreeSet<Triple> {
        let mut triples = BTreeSet::new();
        for (y, m) in &self.marks {
            let adj: Vec<&Node> = m.keys().collect();
            for i in 0..adj.len() {
                for j in (i + 1)..adj.len() {
                    triples.insert(Triple::new(adj[i], y, adj[j]));
                }
            }
        }
        triples
    }

    /// Whether both graphs have exactly the same adjacencies.
    pub fn same_adjacencies(&self, other: &Graph) -> bool {
        self.num_edges() == other.num_edges() && self.edges().all(|e| other.is_adjacent(e.node1(), e.node2()))
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Graph Nodes:")?;
        writeln!(f, "{}", self.node_names().join(";"))?;
        writeln!(f)?;
        writeln!(f, "Graph Edges:")?;
        for (i, edge) in self.edges().enumerate() {
            writeln!(f, "{}. {}", i + 1, edge)?;
        }
        if !self.underlines.is_empty() {
            writeln!(f)?;
            writeln!(f, "Underlines:")?;
            for triple in &self.underlines {
                writeln!(f, "{}", triple)?;
            }
        }
        Ok(())
    }
}
