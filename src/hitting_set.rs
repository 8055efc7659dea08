//! Minimum hitting sets.
//!
//! Given a family of sets, a *hitting set* picks elements so that every set contains at least one
//! picked element. The solver works on an arena of the distinct elements: element `i` carries a
//! [`BitSet`] of the family members it hits, and a selection hits everything when the union of
//! its bit sets is full. Selections are tried by increasing size, so the first size that yields
//! an accepted selection is the minimum one, and all accepted selections of that size are
//! returned.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeSet;
//! use ion_rs::hitting_set::minimum_hitting_sets;
//!
//! let family: Vec<BTreeSet<char>> = vec![['a', 'b'].into(), ['b', 'c'].into()];
//! let hits = minimum_hitting_sets(&family, |_| true);
//! assert_eq!(hits, vec![vec![&'b']]);
//! ```

use std::collections::BTreeSet;

use log::debug;

use crate::bitset::BitSet;
use crate::change::GraphChange;
use crate::graph::Graph;
use crate::subsets::Combinations;

/// All minimum-cardinality selections hitting every set of `family` that pass `accept`.
///
/// An empty family is hit by the empty selection; a family with an empty member cannot be hit.
/// Selections are returned in lexicographic order of the elements' arena positions.
pub fn minimum_hitting_sets<'a, T, F>(family: &'a [BTreeSet<T>], mut accept: F) -> Vec<Vec<&'a T>>
where
    T: Ord,
    F: FnMut(&[&'a T]) -> bool,
{
    if family.is_empty() {
        return vec![Vec::new()];
    }
    if family.iter().any(|s| s.is_empty()) {
        return Vec::new();
    }

    let elements: Vec<&T> = family.iter().flatten().collect::<BTreeSet<&T>>().into_iter().collect();
    let coverage: Vec<BitSet> = elements
        .iter()
        .map(|&e| {
            let hit = family.iter().enumerate().filter(|(_, s)| s.contains(e)).map(|(i, _)| i);
            BitSet::from_indices(family.len(), hit)
        })
        .collect();

    // One element per member always suffices, so larger selections are never minimal.
    let max_size = elements.len().min(family.len());
    for k in 1..=max_size {
        let mut found = Vec::new();
        let mut rejected = 0usize;
        for combo in Combinations::new(elements.len(), k) {
            let mut covered = BitSet::new(family.len());
            for &i in &combo {
                covered.union_with(&coverage[i]);
            }
            if !covered.is_full() {
                continue;
            }
            let selection: Vec<&T> = combo.iter().map(|&i| elements[i]).collect();
            if accept(&selection) {
                found.push(selection);
            } else {
                rejected += 1;
            }
        }
        if !found.is_empty() {
            debug!(
                "Hitting sets: {} of size {} over {} elements and {} sets ({} rejected)",
                found.len(),
                k,
                elements.len(),
                family.len(),
                rejected
            );
            return found;
        }
    }
    debug!("No acceptable hitting set over {} sets", family.len());
    Vec::new()
}

/// Minimum hitting sets of a family of alternative changes, each merged into a single
/// [`GraphChange`] consistent with `graph`.
pub fn find_hitting_sets(family: &[BTreeSet<GraphChange>], graph: &Graph) -> Vec<GraphChange> {
    minimum_hitting_sets(family, |selection| {
        GraphChange::merged(selection.iter().copied()).is_consistent_with(graph)
    })
    .into_iter()
    .map(GraphChange::merged)
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect()
}
