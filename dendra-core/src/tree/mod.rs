//! Rooted trees stored as parent arrays, and hierarchies pairing a tree with
//! node altitudes.
//!
//! Nodes are numbered so that leaves come first and every non-root node has a
//! parent with a larger index; the root is the last node and is its own
//! parent. Iterating nodes in increasing order therefore visits children before
//! parents.

mod attributes;
mod simplify;

use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::TreeError;

pub use self::{
    attributes::{
        attribute_area, attribute_depth, attribute_dynamics, attribute_minima, attribute_volume,
    },
    simplify::{SimplifiedTree, simplify_tree},
};

/// A validated rooted tree.
///
/// # Examples
/// ```
/// use dendra_core::Tree;
///
/// let tree = Tree::from_parents(vec![3, 3, 4, 4, 4])?;
/// assert_eq!(tree.num_leaves(), 3);
/// assert_eq!(tree.root(), 4);
/// assert_eq!(tree.children(3), &[0, 1]);
/// # Ok::<(), dendra_core::TreeError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "Vec<usize>", into = "Vec<usize>")
)]
pub struct Tree {
    parents: Vec<usize>,
    num_leaves: usize,
    child_offsets: Vec<usize>,
    child_nodes: Vec<usize>,
}

impl Tree {
    /// Validates `parents` and builds the child lists.
    ///
    /// # Errors
    /// Returns [`TreeError`] when the array is empty, when a parent index does
    /// not exceed its child's, when the last node is not the only root, or
    /// when a leaf follows an internal node.
    pub fn from_parents(parents: Vec<usize>) -> Result<Self, TreeError> {
        let node_count = parents.len();
        let root = node_count.checked_sub(1).ok_or(TreeError::Empty)?;
        if parents[root] != root {
            return Err(TreeError::MissingRoot {
                node: root,
                parent: parents[root],
            });
        }

        let mut child_counts = vec![0_usize; node_count];
        for (node, &parent) in parents.iter().enumerate().take(root) {
            if parent == node {
                return Err(TreeError::MultipleRoots { node });
            }
            if parent >= node_count {
                return Err(TreeError::ParentOutOfRange {
                    node,
                    parent,
                    node_count,
                });
            }
            if parent < node {
                return Err(TreeError::ParentOrder { node, parent });
            }
            child_counts[parent] += 1;
        }

        let num_leaves = child_counts
            .iter()
            .position(|&count| count > 0)
            .unwrap_or(node_count);
        if let Some(offset) = child_counts[num_leaves..]
            .iter()
            .position(|&count| count == 0)
        {
            return Err(TreeError::LeafAfterInternal {
                node: num_leaves + offset,
                first_internal: num_leaves,
            });
        }

        Ok(Self::assemble(parents, num_leaves))
    }

    /// Builds the child lists of an already validated parent array.
    pub(crate) fn assemble(parents: Vec<usize>, num_leaves: usize) -> Self {
        let node_count = parents.len();
        let root = node_count - 1;
        let mut child_counts = vec![0_usize; node_count];
        for &parent in &parents[..root] {
            child_counts[parent] += 1;
        }

        let mut child_offsets = Vec::with_capacity(node_count + 1);
        let mut total = 0;
        child_offsets.push(total);
        for count in child_counts {
            total += count;
            child_offsets.push(total);
        }
        let mut cursor = child_offsets.clone();
        let mut child_nodes = vec![0; root];
        for (node, &parent) in parents.iter().enumerate().take(root) {
            child_nodes[cursor[parent]] = node;
            cursor[parent] += 1;
        }

        Self {
            parents,
            num_leaves,
            child_offsets,
            child_nodes,
        }
    }

    /// Total number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.parents.len()
    }

    /// Number of leaves; leaves are the nodes `0..num_leaves()`.
    #[must_use]
    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    /// Index of the root, always the last node.
    #[must_use]
    pub fn root(&self) -> usize {
        self.parents.len() - 1
    }

    /// The parent array. The root is its own parent.
    #[must_use]
    pub fn parents(&self) -> &[usize] {
        &self.parents
    }

    /// Parent of `node`.
    ///
    /// # Panics
    /// Panics when `node` is out of range.
    #[must_use]
    pub fn parent(&self, node: usize) -> usize {
        self.parents[node]
    }

    /// Children of `node` in increasing index order.
    ///
    /// # Panics
    /// Panics when `node` is out of range.
    #[must_use]
    pub fn children(&self, node: usize) -> &[usize] {
        &self.child_nodes[self.child_offsets[node]..self.child_offsets[node + 1]]
    }

    /// Whether `node` has no children.
    #[must_use]
    pub fn is_leaf(&self, node: usize) -> bool {
        node < self.num_leaves
    }

    /// Whether `node` is the root.
    #[must_use]
    pub fn is_root(&self, node: usize) -> bool {
        node == self.root()
    }

    /// Leaf node range.
    #[must_use]
    pub fn leaves(&self) -> Range<usize> {
        0..self.num_leaves
    }

    /// Internal node range, in leaves-to-root order.
    #[must_use]
    pub fn internal_nodes(&self) -> Range<usize> {
        self.num_leaves..self.node_count()
    }

    /// Consumes the tree and returns its parent array.
    #[must_use]
    pub fn into_parents(self) -> Vec<usize> {
        self.parents
    }
}

impl TryFrom<Vec<usize>> for Tree {
    type Error = TreeError;

    fn try_from(parents: Vec<usize>) -> Result<Self, Self::Error> {
        Self::from_parents(parents)
    }
}

impl From<Tree> for Vec<usize> {
    fn from(tree: Tree) -> Self {
        tree.into_parents()
    }
}

/// A tree whose nodes carry altitudes that never decrease towards the root.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "HierarchyParts", into = "HierarchyParts")
)]
pub struct Hierarchy {
    tree: Tree,
    altitudes: Vec<f64>,
}

impl Hierarchy {
    /// Pairs `tree` with `altitudes`, one per node.
    ///
    /// # Errors
    /// Returns [`TreeError::AltitudeLengthMismatch`] for a wrong length,
    /// [`TreeError::NanAltitude`] for NaN entries and
    /// [`TreeError::NonMonotonicAltitude`] when a node lies above its parent.
    pub fn new(tree: Tree, altitudes: Vec<f64>) -> Result<Self, TreeError> {
        if altitudes.len() != tree.node_count() {
            return Err(TreeError::AltitudeLengthMismatch {
                expected: tree.node_count(),
                got: altitudes.len(),
            });
        }
        if let Some(node) = altitudes.iter().position(|altitude| altitude.is_nan()) {
            return Err(TreeError::NanAltitude { node });
        }
        for (node, &parent) in tree.parents().iter().enumerate() {
            if altitudes[node] > altitudes[parent] {
                return Err(TreeError::NonMonotonicAltitude {
                    node,
                    parent,
                    altitude: altitudes[node],
                    parent_altitude: altitudes[parent],
                });
            }
        }
        Ok(Self { tree, altitudes })
    }

    /// The underlying tree.
    #[must_use]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// One altitude per node.
    #[must_use]
    pub fn altitudes(&self) -> &[f64] {
        &self.altitudes
    }

    /// Consumes the hierarchy.
    #[must_use]
    pub fn into_parts(self) -> (Tree, Vec<f64>) {
        (self.tree, self.altitudes)
    }

    /// Removes every non-root internal node whose altitude equals its
    /// parent's, re-attaching its children to the nearest kept ancestor.
    #[must_use]
    pub fn canonize(&self) -> Self {
        let tree = &self.tree;
        let altitudes = &self.altitudes;
        let simplified = simplify_tree(tree, |node| {
            altitudes[node] == altitudes[tree.parent(node)]
        });
        let altitudes = simplified
            .node_map()
            .iter()
            .map(|&node| self.altitudes[node])
            .collect();
        Self {
            tree: simplified.into_tree(),
            altitudes,
        }
    }
}

#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct HierarchyParts {
    parents: Tree,
    altitudes: Vec<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<HierarchyParts> for Hierarchy {
    type Error = TreeError;

    fn try_from(parts: HierarchyParts) -> Result<Self, Self::Error> {
        Self::new(parts.parents, parts.altitudes)
    }
}

#[cfg(feature = "serde")]
impl From<Hierarchy> for HierarchyParts {
    fn from(hierarchy: Hierarchy) -> Self {
        let (parents, altitudes) = hierarchy.into_parts();
        Self { parents, altitudes }
    }
}

#[cfg(test)]
mod tests;
