//! Path-blocking search.
//!
//! Every pair recorded as separated must end up m-separated in each candidate. Starting from the
//! merged graph, the search repeatedly looks for paths that could still connect a separated pair,
//! collects for each path the alternative edits that would destroy it, and branches on every
//! minimum consistent hitting set of those alternatives.
//!
//! With `path_length_search` the paths are examined by increasing number of edges, so that
//! short paths are blocked before longer ones are even enumerated. With `adjacency_search` each
//! separated pair is handled in its own round.

use std::collections::{BTreeSet, VecDeque};
use std::time::Instant;

use log::{debug, trace};

use crate::change::GraphChange;
use crate::connecting::PossibleConnectingPath;
use crate::facts::{FactDatabase, IndependenceFact};
use crate::graph::{Endpoint, Graph, Node, Triple};
use crate::hitting_set::find_hitting_sets;
use crate::ion::{IonConfig, IonStats};

/// Runs the path-blocking search from `initial` and returns every accepted candidate.
pub fn block_paths(initial: Graph, facts: &FactDatabase, config: &IonConfig, stats: &mut IonStats) -> BTreeSet<Graph> {
    let separations: Vec<&IndependenceFact> = facts.separations().collect();
    let mut accepted = BTreeSet::new();
    if separations.is_empty() {
        debug!("No separations to enforce");
        accepted.insert(initial);
        return accepted;
    }

    let lengths: Vec<Option<usize>> = if config.path_length_search {
        (2..initial.num_nodes()).map(Some).collect()
    } else {
        vec![None]
    };
    if lengths.is_empty() {
        // Fewer than three variables: no path can pass through a third node.
        accepted.insert(initial);
        return accepted;
    }
    let rounds: Vec<Vec<&IndependenceFact>> = if config.adjacency_search {
        separations.iter().map(|&f| vec![f]).collect()
    } else {
        vec![separations]
    };

    let mut rejected: BTreeSet<Graph> = BTreeSet::new();
    let mut queue = VecDeque::from([initial]);
    for length in lengths {
        for round in &rounds {
            queue.extend(std::mem::take(&mut accepted));
            stats.step3_queue_sizes.push(queue.len());
            debug!("Blocking paths of length {:?} for {} facts, {} candidates", length, round.len(), queue.len());

            while let Some(pag) = queue.pop_front() {
                let paths = possible_paths(&pag, round, length);
                if paths.is_empty() {
                    accepted.insert(pag);
                    continue;
                }
                trace!("{} possibly connecting paths", paths.len());

                let Some(family) = filter_changes(&pag, find_changes(&pag, &paths)) else {
                    debug!("Dead end: some path cannot be blocked");
                    continue;
                };
                let start = Instant::now();
                let hitting_sets = find_hitting_sets(&family, &pag);
                stats.record_hitting_set(start.elapsed());

                for change in hitting_sets {
                    let Some(changed) = change.apply_to(&pag) else {
                        trace!("Inapplicable change {}", change);
                        continue;
                    };
                    if accepted.contains(&changed) || rejected.contains(&changed) {
                        continue;
                    }
                    if changed.exists_directed_cycle() || facts.predicts_false_independence(&changed) {
                        debug!("Rejected candidate after {}", change);
                        rejected.insert(changed);
                        continue;
                    }
                    accepted.insert(changed);
                }
            }
        }
    }
    debug!("Path blocking done: {} accepted, {} rejected", accepted.len(), rejected.len());
    accepted
}

/// Possibly connecting paths for every conditioning set of every fact in `facts`.
fn possible_paths(graph: &Graph, facts: &[&IndependenceFact], length: Option<usize>) -> Vec<PossibleConnectingPath> {
    let mut paths = Vec::new();
    for fact in facts {
        for z in fact.conditioning_sets() {
            paths.extend(match length {
                Some(l) => PossibleConnectingPath::find_of_length(graph, fact.x(), fact.y(), z, l),
                None => PossibleConnectingPath::find(graph, fact.x(), fact.y(), z),
            });
        }
    }
    paths
}

/// For each path, the set of alternative edits that would destroy it.
pub fn find_changes(graph: &Graph, paths: &[PossibleConnectingPath]) -> Vec<BTreeSet<GraphChange>> {
    let family: BTreeSet<BTreeSet<GraphChange>> = paths.iter().map(|p| path_changes(graph, p)).collect();
    family.into_iter().collect()
}

fn path_changes(graph: &Graph, path: &PossibleConnectingPath) -> BTreeSet<GraphChange> {
    let nodes = path.path();
    let conditions = path.conditions();
    let outside = path.outside_conditions();
    let mut changes = BTreeSet::new();

    for i in 0..nodes.len() - 1 {
        let (current, next) = (&nodes[i], &nodes[i + 1]);
        changes.insert(GraphChange::removing(current, next));
        if i == 0 {
            continue;
        }
        let prev = &nodes[i - 1];
        let triple = Triple::new(prev, current, next);
        if conditions.contains(current) {
            changes.insert(GraphChange::noncollider(triple));
            continue;
        }
        if graph.is_underline(prev, current, next)
            || graph.endpoint(prev, current) == Some(Endpoint::Tail)
            || graph.endpoint(next, current) == Some(Endpoint::Tail)
        {
            continue;
        }
        changes.extend(collider_changes(graph, triple, &outside));
    }
    changes
}

/// Ways to make the middle of `triple` a collider without it being an ancestor of `outside`.
///
/// If the midpoint has no semi-directed path into the outside conditioning nodes, the plain
/// collider suffices. Otherwise each such path must also be broken, either by removing one of its
/// edges or by putting an arrowhead against its direction.
fn collider_changes(graph: &Graph, triple: Triple, outside: &[&Node]) -> Vec<GraphChange> {
    let descendant_paths: Vec<Vec<Node>> = outside
        .iter()
        .flat_map(|z| graph.semi_directed_paths(triple.y(), z))
        .collect();
    if descendant_paths.is_empty() {
        return vec![GraphChange::collider(triple)];
    }

    let mut changes = Vec::new();
    for path in &descendant_paths {
        for step in path.windows(2) {
            let (from, to) = (&step[0], &step[1]);
            let mut removed = GraphChange::collider(triple.clone());
            removed.add_remove(from, to);
            changes.push(removed);

            let mut reversed = GraphChange::collider(triple.clone());
            reversed.add_orient(to, from);
            changes.push(reversed);
        }
    }
    changes
}

/// Drops changes contradicting the current triple classification of `graph`.
///
/// Returns `None` if some path is left with no way to block it.
pub fn filter_changes(graph: &Graph, family: Vec<BTreeSet<GraphChange>>) -> Option<Vec<BTreeSet<GraphChange>>> {
    family
        .into_iter()
        .map(|changes| {
            let kept: BTreeSet<GraphChange> = changes
                .into_iter()
                .filter(|c| {
                    c.colliders().all(|t| !graph.is_underline(t.x(), t.y(), t.z()))
                        && c.noncolliders().all(|t| !graph.is_def_collider(t.x(), t.y(), t.z()))
                })
                .collect();
            (!kept.is_empty()).then_some(kept)
        })
        .collect()
}
