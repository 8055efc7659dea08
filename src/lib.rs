//! # ion-rs: Integration of Overlapping Networks
//!
//! **`ion-rs`** integrates causal structures learned separately over overlapping sets of
//! variables. Each input is a *Partial Ancestral Graph* (PAG): a graph whose edges carry one
//! mark per side, an arrowhead, a tail, or a circle (unknown). The result is every PAG over the
//! union of the variables that agrees with the independence and dependence information of each
//! input.
//!
//! ## How it works
//!
//! The search is a branch-and-prune enumeration:
//!
//! - the inputs are merged into one graph, conflicting marks becoming circles;
//! - the m-separations and m-connections of each input become a fact database;
//! - every path of the merged graph that could still connect a separated pair is blocked, by
//!   branching on the minimum hitting sets of the edits that would destroy each path;
//! - edges not needed to explain any association are optionally removed;
//! - undecided unshielded triples are enumerated as colliders or not, and the circles are
//!   propagated to a fixpoint by the final orientation rules.
//!
//! Every candidate is rejected as soon as it is cyclic or separates a pair the facts say is
//! associated. All containers are ordered, so results do not depend on hashing or insertion
//! order.
//!
//! ## Basic Usage
//!
//! ```rust
//! use ion_rs::graph::{Edge, Graph, Node};
//! use ion_rs::ion::Ion;
//!
//! let (x, y, z) = (Node::new("X"), Node::new("Y"), Node::new("Z"));
//!
//! // 1. Two graphs sharing `Y`
//! let mut g1 = Graph::new([x.clone(), y.clone()]);
//! g1.add_edge(Edge::partially_oriented(&x, &y));
//! let mut g2 = Graph::new([y.clone(), z.clone()]);
//! g2.add_edge(Edge::nondirected(&y, &z));
//!
//! // 2. Search
//! let mut ion = Ion::new(vec![g1, g2]).unwrap();
//! let pags = ion.search();
//!
//! // 3. Every result is over all three variables
//! for pag in &pags {
//!     assert_eq!(pag.num_nodes(), 3);
//!     assert!(!pag.exists_directed_cycle());
//! }
//! ```
//!
//! ## Core Components
//!
//! - **[`graph`]** and **[`separation`]**: the PAG data structure and its path queries.
//! - **[`ion`]**: the [`Ion`][crate::ion::Ion] search driver, its configuration and statistics.
//! - **[`hitting_set`]**: the minimum hitting-set solver used to block paths.
//! - **[`orientation`]**: the final orientation rules.
//! - **[`dot`]**: Graphviz rendering.

pub mod bitset;
pub mod blocking;
pub mod change;
pub mod connecting;
pub mod dot;
pub mod equivalence;
pub mod error;
pub mod facts;
pub mod filters;
pub mod graph;
pub mod hitting_set;
pub mod ion;
pub mod knowledge;
pub mod orientation;
pub mod redundancy;
pub mod separation;
pub mod subsets;
pub mod transfer;
