//! Fixed-universe bit sets.
//!
//! The hitting-set solver numbers the members of a family `0..n` and records, for every
//! candidate element, which members it hits. A selection of elements hits the whole family when
//! the union of their sets is [full](BitSet::is_full).

/// A set of indices drawn from `0..universe`, packed into 64-bit words.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct BitSet {
    words: Box<[u64]>,
    universe: usize,
}

const WORD: usize = u64::BITS as usize;

impl BitSet {
    /// Creates an empty set over `0..universe`.
    pub fn new(universe: usize) -> Self {
        Self {
            words: vec![0; universe.div_ceil(WORD)].into_boxed_slice(),
            universe,
        }
    }

    /// Builds a set over `0..universe` from the given indices.
    ///
    /// # Panics
    ///
    /// Panics if an index is outside the universe.
    pub fn from_indices(universe: usize, indices: impl IntoIterator<Item = usize>) -> Self {
        let mut set = Self::new(universe);
        for i in indices {
            set.insert(i);
        }
        set
    }

    /// Number of indices in the set.
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether the set contains the whole universe.
    pub fn is_full(&self) -> bool {
        self.len() == self.universe
    }

    /// Adds `index`, returning whether it was absent.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the universe.
    #[inline]
    pub fn insert(&mut self, index: usize) -> bool {
        assert!(index < self.universe, "Index {} outside universe of {}", index, self.universe);
        let word = &mut self.words[index / WORD];
        let bit = 1u64 << (index % WORD);
        let absent = *word & bit == 0;
        *word |= bit;
        absent
    }

    /// In-place union with a set over the same universe.
    pub fn union_with(&mut self, other: &BitSet) {
        debug_assert_eq!(self.universe, other.universe);
        for (w, o) in self.words.iter_mut().zip(other.words.iter()) {
            *w |= o;
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_empty() {
        let empty = BitSet::new(70);
        assert_eq!(empty.len(), 0);
        assert!(!empty.is_full());
        assert!(BitSet::new(0).is_full());
    }

    #[test]
    fn test_insert() {
        let mut set = BitSet::new(100);
        assert!(set.insert(42));
        assert!(!set.insert(42));
        assert!(set.insert(99));
        assert_eq!(set.len(), 2);
    }

    #[test]
    #[should_panic(expected = "outside universe")]
    fn test_insert_outside_universe() {
        BitSet::new(3).insert(3);
    }

    #[test]
    fn test_union_until_full() {
        let a = BitSet::from_indices(3, [0, 2]);
        let b = BitSet::from_indices(3, [1, 2]);
        let mut covered = BitSet::new(3);
        covered.union_with(&a);
        assert!(!covered.is_full());
        assert_eq!(covered, a);
        covered.union_with(&b);
        assert!(covered.is_full());
        assert_eq!(covered.len(), 3);
    }

    #[test]
    fn test_union_across_words() {
        let mut set = BitSet::from_indices(130, [0, 64, 129]);
        set.union_with(&BitSet::from_indices(130, (1..64).chain(65..129)));
        assert!(set.is_full());
    }
}
