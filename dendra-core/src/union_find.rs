//! Disjoint-set forest used by the flooding labeller and the tree builders.
//!
//! Union by rank with full path compression. Element ids must lie in
//! `0..len()`; the crate only passes ids it has already range-checked.

/// Disjoint sets over the elements `0..len()`.
///
/// # Examples
/// ```
/// use dendra_core::DisjointSet;
///
/// let mut sets = DisjointSet::new(4);
/// assert!(sets.union(0, 1));
/// assert!(!sets.union(1, 0));
/// assert_eq!(sets.find(0), sets.find(1));
/// assert_eq!(sets.component_count(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
    components: usize,
}

impl DisjointSet {
    /// Creates `len` singleton sets.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
            components: len,
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Whether the forest holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Number of disjoint sets.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components
    }

    /// Returns the representative of `element`'s set, compressing the path
    /// walked.
    ///
    /// # Panics
    /// Panics when `element >= len()`.
    pub fn find(&mut self, mut element: usize) -> usize {
        let mut root = element;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[element] != root {
            let next = self.parent[element];
            self.parent[element] = root;
            element = next;
        }
        root
    }

    /// Merges the sets holding `left` and `right`. Returns `false` when they
    /// were already the same set.
    ///
    /// # Panics
    /// Panics when either element is out of range.
    pub fn union(&mut self, left: usize, right: usize) -> bool {
        let left = self.find(left);
        let right = self.find(right);
        if left == right {
            return false;
        }
        self.union_roots(left, right);
        true
    }

    /// Links two distinct roots by rank and returns the surviving root.
    ///
    /// Both arguments must be current representatives.
    pub fn union_roots(&mut self, left: usize, right: usize) -> usize {
        debug_assert_ne!(left, right, "roots must differ");
        let (winner, loser) = match self.rank[left].cmp(&self.rank[right]) {
            std::cmp::Ordering::Less => (right, left),
            std::cmp::Ordering::Greater => (left, right),
            std::cmp::Ordering::Equal => {
                self.rank[left] = self.rank[left].saturating_add(1);
                (left, right)
            }
        };
        self.parent[loser] = winner;
        self.components -= 1;
        winner
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::DisjointSet;
    use crate::test_utils::suite_proptest_config;

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(5)]
    fn new_forest_is_all_singletons(#[case] len: usize) {
        let mut sets = DisjointSet::new(len);
        assert_eq!(sets.len(), len);
        assert_eq!(sets.component_count(), len);
        for element in 0..len {
            assert_eq!(sets.find(element), element);
        }
    }

    #[test]
    fn union_roots_returns_survivor() {
        let mut sets = DisjointSet::new(3);
        let root = sets.union_roots(0, 1);
        assert_eq!(sets.find(0), root);
        assert_eq!(sets.find(1), root);
        let merged = sets.union_roots(root, 2);
        assert_eq!(merged, root, "higher rank root survives");
        assert_eq!(sets.component_count(), 1);
    }

    proptest! {
        #![proptest_config(suite_proptest_config(256))]

        #[test]
        fn find_is_idempotent_and_agrees_with_unions(
            len in 1_usize..40,
            pairs in proptest::collection::vec((0_usize..40, 0_usize..40), 0..80),
        ) {
            let mut sets = DisjointSet::new(len);
            let mut naive: Vec<usize> = (0..len).collect();
            for (left, right) in pairs {
                let (left, right) = (left % len, right % len);
                let merged = sets.union(left, right);
                let (from, to) = (naive[left], naive[right]);
                prop_assert_eq!(merged, from != to);
                for label in &mut naive {
                    if *label == from {
                        *label = to;
                    }
                }
            }
            for element in 0..len {
                let root = sets.find(element);
                prop_assert_eq!(sets.find(root), root);
                prop_assert_eq!(sets.find(element), root);
            }
            for left in 0..len {
                for right in 0..len {
                    prop_assert_eq!(
                        sets.find(left) == sets.find(right),
                        naive[left] == naive[right]
                    );
                }
            }
            let distinct: std::collections::BTreeSet<_> = naive.iter().collect();
            prop_assert_eq!(sets.component_count(), distinct.len());
        }
    }
}
