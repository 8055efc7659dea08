//! The ION search driver.
//!
//! [`Ion`] integrates PAGs learned over overlapping variable sets into every PAG over the union
//! of the variables that agrees with the independence and dependence information of each input:
//!
//! 1. transfer the local adjacencies and marks into one graph ([`transfer_local`]);
//! 2. extract the separation and association facts of the inputs ([`FactDatabase::extract`]);
//! 3. block every path that could connect a separated pair ([`block_paths`]);
//! 4. branch over the edges no association needs ([`eliminate_redundancy`]);
//! 5. enumerate the collider disambiguations and orient them ([`enumerate_equivalents`]).
//!
//! The result is then screened against background knowledge, if any, and against the
//! orientations of the inputs ([`retain_corroborated`]).
//!
//! # Example
//!
//! ```
//! use ion_rs::graph::{Edge, Graph, Node};
//! use ion_rs::ion::Ion;
//!
//! let (x, y, z) = (Node::new("X"), Node::new("Y"), Node::new("Z"));
//!
//! let mut g1 = Graph::new([x.clone(), y.clone()]);
//! g1.add_edge(Edge::nondirected(&x, &y));
//! let mut g2 = Graph::new([y.clone(), z.clone()]);
//! g2.add_edge(Edge::nondirected(&y, &z));
//!
//! let mut ion = Ion::new(vec![g1, g2]).unwrap();
//! let pags = ion.search();
//! assert!(!pags.is_empty());
//! for pag in &pags {
//!     assert!(pag.is_adjacent(&x, &y));
//!     assert!(pag.is_adjacent(&y, &z));
//! }
//! ```

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use log::{debug, info};
use num_bigint::BigUint;

use crate::blocking::block_paths;
use crate::equivalence::enumerate_equivalents;
use crate::error::IonError;
use crate::facts::FactDatabase;
use crate::filters::{apply_knowledge, retain_corroborated};
use crate::graph::{Graph, Node, NodeType};
use crate::knowledge::Knowledge;
use crate::redundancy::eliminate_redundancy;
use crate::transfer::transfer_local;

/// Search prunings.
///
/// Full completeness requires disabling both `path_length_search` and `adjacency_search`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IonConfig {
    /// Block paths by increasing number of edges (default: true)
    pub path_length_search: bool,
    /// Block the paths of one separated pair at a time (default: false)
    pub adjacency_search: bool,
    /// Let redundancy elimination remove edges between variables never measured together
    /// (default: false)
    pub remove_placeholder_edges: bool,
}

impl Default for IonConfig {
    fn default() -> Self {
        Self {
            path_length_search: true,
            adjacency_search: false,
            remove_placeholder_edges: false,
        }
    }
}

/// Statistics of the last [`Ion::search`].
#[derive(Debug, Clone, Default)]
pub struct IonStats {
    /// Wall-clock time of the whole search
    pub runtime: Duration,
    /// Queue size at the start of every path-blocking iteration
    pub step3_queue_sizes: Vec<usize>,
    /// Number of hitting-set computations
    pub hitting_set_calls: usize,
    /// Time spent computing hitting sets
    pub hitting_set_total: Duration,
    /// Longest single hitting-set computation
    pub hitting_set_longest: Duration,
    /// Candidates after path blocking
    pub step3_candidates: usize,
    /// Candidates after redundancy elimination
    pub step4_candidates: usize,
    /// Graphs in the final result
    pub step5_candidates: usize,
    /// Collider disambiguations tried in step 5
    pub disambiguation_branches: BigUint,
}

impl IonStats {
    pub fn record_hitting_set(&mut self, elapsed: Duration) {
        self.hitting_set_calls += 1;
        self.hitting_set_total += elapsed;
        self.hitting_set_longest = self.hitting_set_longest.max(elapsed);
    }

    /// Total number of graphs taken through path blocking.
    pub fn total_iterations(&self) -> usize {
        self.step3_queue_sizes.iter().sum()
    }

    pub fn largest_iteration(&self) -> usize {
        self.step3_queue_sizes.iter().copied().max().unwrap_or(0)
    }

    pub fn average_iteration(&self) -> f64 {
        if self.step3_queue_sizes.is_empty() {
            return 0.0;
        }
        self.total_iterations() as f64 / self.step3_queue_sizes.len() as f64
    }

    pub fn average_hitting_set_time(&self) -> Duration {
        match u32::try_from(self.hitting_set_calls) {
            Ok(0) => Duration::ZERO,
            Ok(calls) => self.hitting_set_total / calls,
            Err(_) => Duration::from_secs_f64(self.hitting_set_total.as_secs_f64() / self.hitting_set_calls as f64),
        }
    }
}

/// Integration of overlapping PAGs.
pub struct Ion {
    inputs: Vec<Graph>,
    variables: Vec<Node>,
    config: IonConfig,
    knowledge: Option<Box<dyn Knowledge>>,
    stats: IonStats,
}

impl Ion {
    /// Prepares a search over `inputs`.
    ///
    /// Every definite noncollider of an input (a triple whose midpoint has a tail toward one of
    /// its neighbours) is underlined, so that the marking survives the merge.
    ///
    /// Fails if there are no inputs, or if a variable has different node types in two inputs.
    pub fn new(mut inputs: Vec<Graph>) -> Result<Self, IonError> {
        if inputs.is_empty() {
            return Err(IonError::EmptyInput);
        }

        let mut variables = Vec::new();
        let mut types: BTreeMap<&str, NodeType> = BTreeMap::new();
        for input in &inputs {
            for node in input.nodes() {
                match types.get(node.name()) {
                    None => {
                        types.insert(node.name(), node.node_type());
                        variables.push(node.clone());
                    }
                    Some(&first) if first != node.node_type() => {
                        return Err(IonError::ConflictingNodeType {
                            name: node.name().to_string(),
                            first,
                            second: node.node_type(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        for input in &mut inputs {
            for t in input.triples() {
                if input.is_def_noncollider(t.x(), t.y(), t.z()) {
                    input.add_underline(t.x(), t.y(), t.z());
                }
            }
        }
        debug!("ION over {} inputs and {} variables", inputs.len(), variables.len());

        Ok(Self {
            inputs,
            variables,
            config: IonConfig::default(),
            knowledge: None,
            stats: IonStats::default(),
        })
    }

    pub fn with_config(mut self, config: IonConfig) -> Self {
        self.config = config;
        self
    }

    /// Attaches background knowledge.
    ///
    /// Fails if the knowledge mentions a variable that no input contains.
    pub fn with_knowledge(mut self, knowledge: impl Knowledge + 'static) -> Result<Self, IonError> {
        if let Some(name) = knowledge
            .variables()
            .into_iter()
            .find(|name| !self.variables.iter().any(|v| v.name() == *name))
        {
            return Err(IonError::UnknownVariable { name: name.to_string() });
        }
        self.knowledge = Some(Box::new(knowledge));
        Ok(self)
    }

    pub fn inputs(&self) -> &[Graph] {
        &self.inputs
    }

    /// Union of the input variables, in order of first appearance.
    pub fn variables(&self) -> &[Node] {
        &self.variables
    }

    pub fn config(&self) -> &IonConfig {
        &self.config
    }

    pub fn stats(&self) -> &IonStats {
        &self.stats
    }

    /// Runs the search and returns every consistent PAG, sorted and deduplicated.
    pub fn search(&mut self) -> Vec<Graph> {
        self.stats = IonStats::default();
        let start = Instant::now();

        let mut step = Instant::now();
        let mut merged = Graph::new(self.variables.iter().cloned());
        let placeholders = transfer_local(&mut merged, &self.variables, &self.inputs);
        let facts = FactDatabase::extract(&self.inputs);
        info!(
            "Steps 1-2: {:?} ({} separated pairs, {} associated pairs)",
            step.elapsed(),
            facts.separations().count(),
            facts.associations().count()
        );

        step = Instant::now();
        let candidates = block_paths(merged, &facts, &self.config, &mut self.stats);
        self.stats.step3_candidates = candidates.len();
        info!("Step 3: {:?} ({} candidates)", step.elapsed(), candidates.len());

        step = Instant::now();
        let skeletons = eliminate_redundancy(candidates, &facts, &self.config, &placeholders);
        self.stats.step4_candidates = skeletons.len();
        info!("Step 4: {:?} ({} skeletons)", step.elapsed(), skeletons.len());

        step = Instant::now();
        let (mut pags, branches) = enumerate_equivalents(&skeletons, &facts, self.knowledge.as_deref());
        self.stats.disambiguation_branches = branches;
        if let Some(knowledge) = self.knowledge.as_deref() {
            pags = apply_knowledge(pags, knowledge, &facts);
        }
        let pags = retain_corroborated(pags, &self.inputs);
        self.stats.step5_candidates = pags.len();
        info!("Step 5: {:?} ({} graphs)", step.elapsed(), pags.len());

        self.stats.runtime = start.elapsed();
        pags.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::graph::Edge;
    use crate::knowledge::BackgroundKnowledge;

    #[test]
    fn test_empty_input() {
        assert_eq!(Ion::new(Vec::new()).err(), Some(IonError::EmptyInput));
    }

    #[test]
    fn test_conflicting_node_type() {
        let g1 = Graph::new([Node::new("L")]);
        let g2 = Graph::new([Node::latent("L")]);
        let err = Ion::new(vec![g1, g2]).err();
        assert_eq!(
            err,
            Some(IonError::ConflictingNodeType {
                name: "L".to_string(),
                first: NodeType::Measured,
                second: NodeType::Latent,
            })
        );
    }

    #[test]
    fn test_variables_in_first_seen_order() {
        let g1 = Graph::new([Node::new("B"), Node::new("C")]);
        let g2 = Graph::new([Node::new("A"), Node::new("C")]);
        let ion = Ion::new(vec![g1, g2]).unwrap();
        let names: Vec<&str> = ion.variables().iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_inputs_are_underlined() {
        let (x, y, z) = (Node::new("X"), Node::new("Y"), Node::new("Z"));
        let mut g = Graph::new([x.clone(), y.clone(), z.clone()]);
        g.add_edge(Edge::directed(&x, &y));
        g.add_edge(Edge::directed(&y, &z));
        let ion = Ion::new(vec![g]).unwrap();
        assert!(ion.inputs()[0].is_underline(&x, &y, &z));
    }

    #[test]
    fn test_unknown_knowledge_variable() {
        let g = Graph::new([Node::new("A")]);
        let mut k = BackgroundKnowledge::new();
        k.set_required("A", "Q");
        let err = Ion::new(vec![g]).unwrap().with_knowledge(k).err();
        assert_eq!(err, Some(IonError::UnknownVariable { name: "Q".to_string() }));
    }

    #[test]
    fn test_stats() {
        let mut stats = IonStats::default();
        assert_eq!(stats.average_iteration(), 0.0);
        assert_eq!(stats.average_hitting_set_time(), Duration::ZERO);

        stats.step3_queue_sizes = vec![1, 3, 2];
        stats.record_hitting_set(Duration::from_millis(4));
        stats.record_hitting_set(Duration::from_millis(2));
        assert_eq!(stats.total_iterations(), 6);
        assert_eq!(stats.largest_iteration(), 3);
        assert_eq!(stats.average_iteration(), 2.0);
        assert_eq!(stats.hitting_set_longest, Duration::from_millis(4));
        assert_eq!(stats.average_hitting_set_time(), Duration::from_millis(3));
    }

    #[test]
    fn test_single_input_is_reproduced() {
        // X o-> Y <-o Z, with X and Z nonadjacent.
        let (x, y, z) = (Node::new("X"), Node::new("Y"), Node::new("Z"));
        let mut g = Graph::new([x.clone(), y.clone(), z.clone()]);
        g.add_edge(Edge::partially_oriented(&x, &y));
        g.add_edge(Edge::partially_oriented(&z, &y));

        let mut ion = Ion::new(vec![g.clone()]).unwrap();
        let pags = ion.search();
        assert_eq!(pags, vec![g]);
        assert_eq!(ion.stats().step5_candidates, 1);
    }
}
