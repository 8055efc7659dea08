//! Lazy subset enumeration: power sets and fixed-size combinations.
//!
//! Both iterators produce their items on demand, so a caller that stops early never pays for the
//! rest of the enumeration. Power sets are indexed by `u64` bit masks, which caps the ground set
//! at 63 elements.

use num_bigint::BigUint;

/// Iterator over all subsets of a ground set, in increasing bit-mask order.
///
/// Subset `mask` contains `items[i]` iff bit `i` of `mask` is set. Every superset of a mask is
/// numerically larger than the mask itself, so a caller can prune supersets of a rejected subset
/// as the enumeration goes (see [`PowerSet::next_with_mask`]).
///
/// # Example
///
/// ```
/// use ion_rs::subsets::PowerSet;
///
/// let subsets: Vec<Vec<char>> = PowerSet::new(vec!['a', 'b']).collect();
/// assert_eq!(subsets, vec![vec![], vec!['a'], vec!['b'], vec!['a', 'b']]);
/// ```
#[derive(Debug, Clone)]
pub struct PowerSet<T> {
    items: Vec<T>,
    next: u64,
    end: u64,
}

impl<T: Clone> PowerSet<T> {
    /// # Panics
    ///
    /// Panics if there are more than 63 items.
    pub fn new(items: Vec<T>) -> Self {
        assert!(items.len() < 64, "Power set of {} items is too large to enumerate", items.len());
        let end = 1u64 << items.len();
        Self { items, next: 0, end }
    }

    /// Total number of subsets, `2^n`.
    pub fn size(&self) -> BigUint {
        subset_count(self.items.len())
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Materializes subset `mask`.
    pub fn subset(&self, mask: u64) -> Vec<T> {
        self.items
            .iter()
            .enumerate()
            .filter(|&(i, _)| mask & (1u64 << i) != 0)
            .map(|(_, item)| item.clone())
            .collect()
    }

    /// Advances the enumeration, returning the subset together with its mask.
    pub fn next_with_mask(&mut self) -> Option<(u64, Vec<T>)> {
        if self.next >= self.end {
            return None;
        }
        let mask = self.next;
        self.next += 1;
        Some((mask, self.subset(mask)))
    }
}

impl<T: Clone> Iterator for PowerSet<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_with_mask().map(|(_, subset)| subset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.end - self.next).ok();
        (remaining.unwrap_or(usize::MAX), remaining)
    }
}

/// Whether `mask` includes every bit of some mask in `dead`.
pub fn is_superset_of_any(mask: u64, dead: &[u64]) -> bool {
    dead.iter().any(|&d| mask & d == d)
}

/// `2^n` as an arbitrary-precision integer.
pub fn subset_count(n: usize) -> BigUint {
    BigUint::from(1u8) << n
}

/// Iterator over all `k`-element index combinations of `0..n`, in lexicographic order.
///
/// ```
/// use ion_rs::subsets::Combinations;
///
/// let combos: Vec<Vec<usize>> = Combinations::new(4, 2).collect();
/// assert_eq!(combos.len(), 6);
/// assert_eq!(combos[0], vec![0, 1]);
/// assert_eq!(combos[5], vec![2, 3]);
/// ```
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    indices: Vec<usize>,
    done: bool,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            done: k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self.indices.clone();

        // Advance to the next combination: bump the rightmost index that still has room.
        let k = self.indices.len();
        let mut i = k;
        loop {
            if i == 0 {
                self.done = true;
                break;
            }
            i -= 1;
            if self.indices[i] < self.n - k + i {
                self.indices[i] += 1;
                for j in (i + 1)..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                break;
            }
        }

        Some(current)
    }
}
