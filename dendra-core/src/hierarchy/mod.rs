//! Hierarchies of graph partitions.
//!
//! This module builds binary partition trees over edge-weighted graphs and
//! re-weights them into watershed hierarchies:
//!
//! - [`bpt_canonical`] merges regions along edges in increasing weight order,
//!   which yields the single-linkage tree whose merge edges form a minimum
//!   spanning tree.
//! - [`binary_partition_tree`] repeatedly merges the two regions joined by the
//!   lightest edge and lets a [`Linkage`] weigh the edges of the merged region.
//! - [`watershed_hierarchy`] ranks the basins of a canonical tree by a
//!   [`Significance`] attribute and rebuilds the hierarchy over those ranks.
//!
//! All builders reject disconnected graphs: a partition tree has a single
//! root, and the graph must be connected for one to exist.

mod agglomerative;
mod canonical;
mod linkage;
mod watershed;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::{GraphError, TreeError},
    tree::{Hierarchy, Tree},
};

pub use self::{
    agglomerative::binary_partition_tree,
    canonical::bpt_canonical,
    linkage::{
        AverageLinkage, CompleteLinkage, Linkage, LinkageKind, MergeNeighbour, RegionMerge,
        SingleLinkage,
    },
    watershed::{
        Area, Criterion, Dynamics, Significance, SignificanceContext, Volume,
        watershed_hierarchy, watershed_hierarchy_by_area, watershed_hierarchy_by_dynamics,
        watershed_hierarchy_by_volume,
    },
};

/// Errors raised while building or re-weighting a hierarchy.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum HierarchyError {
    /// The graph has no vertices.
    #[error("cannot build a hierarchy over a graph without vertices")]
    EmptyGraph,
    /// The graph has more than one connected component.
    #[error("graph is disconnected: {components} components remain after merging")]
    DisconnectedGraph {
        /// Number of connected components.
        components: usize,
    },
    /// A linkage produced a weight below the altitude of the merge that
    /// created the edge, or a NaN weight.
    #[error("linkage weighed edge {edge} at {weight}, below merge altitude {altitude}")]
    NonMonotonicLinkage {
        /// Index of the new edge.
        edge: usize,
        /// Weight assigned by the linkage.
        weight: f64,
        /// Altitude of the merge that created the edge.
        altitude: f64,
    },
    /// An average-linkage edge carried a count that is not a positive number.
    #[error("edge {edge} has invalid fine edge count {count}")]
    InvalidEdgeCount {
        /// Index of the offending edge.
        edge: usize,
        /// The rejected count.
        count: f64,
    },
    /// A node of a partition tree did not have exactly two children.
    #[error("node {node} has {children} children; partition trees are binary")]
    NotBinary {
        /// The offending node.
        node: usize,
        /// Number of children found.
        children: usize,
    },
    /// A partition tree did not record one merge edge per internal node.
    #[error("expected {expected} merge edges but got {got}")]
    MergeEdgeCount {
        /// Number of internal nodes.
        expected: usize,
        /// Number of merge edges supplied.
        got: usize,
    },
    /// A significance attribute did not return one score per node.
    #[error("significance produced {got} scores for {expected} nodes")]
    ScoreLengthMismatch {
        /// Number of tree nodes.
        expected: usize,
        /// Number of scores produced.
        got: usize,
    },
    /// The input graph or its weights were rejected.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// The assembled tree was rejected.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl HierarchyError {
    /// Returns a stable, machine-readable error code for the variant.
    #[must_use]
    pub const fn code(&self) -> HierarchyErrorCode {
        match self {
            Self::EmptyGraph => HierarchyErrorCode::EmptyGraph,
            Self::DisconnectedGraph { .. } => HierarchyErrorCode::DisconnectedGraph,
            Self::NonMonotonicLinkage { .. } => HierarchyErrorCode::NonMonotonicLinkage,
            Self::InvalidEdgeCount { .. } => HierarchyErrorCode::InvalidEdgeCount,
            Self::NotBinary { .. } => HierarchyErrorCode::NotBinary,
            Self::MergeEdgeCount { .. } => HierarchyErrorCode::MergeEdgeCount,
            Self::ScoreLengthMismatch { .. } => HierarchyErrorCode::ScoreLengthMismatch,
            Self::Graph(_) => HierarchyErrorCode::Graph,
            Self::Tree(_) => HierarchyErrorCode::Tree,
        }
    }
}

/// Machine-readable error codes for [`HierarchyError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum HierarchyErrorCode {
    /// The graph has no vertices.
    EmptyGraph,
    /// The graph is disconnected.
    DisconnectedGraph,
    /// A linkage broke altitude monotonicity.
    NonMonotonicLinkage,
    /// An average-linkage count was invalid.
    InvalidEdgeCount,
    /// A partition tree node was not binary.
    NotBinary,
    /// Merge edges did not match the internal nodes.
    MergeEdgeCount,
    /// A significance attribute returned the wrong number of scores.
    ScoreLengthMismatch,
    /// The graph or its weights were rejected.
    Graph,
    /// The assembled tree was rejected.
    Tree,
}

impl HierarchyErrorCode {
    /// Returns the symbolic identifier for logging and metrics surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmptyGraph => "HIERARCHY_EMPTY_GRAPH",
            Self::DisconnectedGraph => "HIERARCHY_DISCONNECTED_GRAPH",
            Self::NonMonotonicLinkage => "HIERARCHY_NON_MONOTONIC_LINKAGE",
            Self::InvalidEdgeCount => "HIERARCHY_INVALID_EDGE_COUNT",
            Self::NotBinary => "HIERARCHY_NOT_BINARY",
            Self::MergeEdgeCount => "HIERARCHY_MERGE_EDGE_COUNT",
            Self::ScoreLengthMismatch => "HIERARCHY_SCORE_LENGTH_MISMATCH",
            Self::Graph => "HIERARCHY_GRAPH",
            Self::Tree => "HIERARCHY_TREE",
        }
    }
}

/// The input edge that witnessed the merge of an internal node.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MergeEdge {
    edge: usize,
    source: usize,
    target: usize,
}

impl MergeEdge {
    /// Records input edge `edge` joining `source` and `target`.
    #[must_use]
    pub const fn new(edge: usize, source: usize, target: usize) -> Self {
        Self {
            edge,
            source,
            target,
        }
    }

    /// Index of the input edge.
    #[must_use]
    pub const fn edge(&self) -> usize {
        self.edge
    }

    /// First endpoint of the input edge.
    #[must_use]
    pub const fn source(&self) -> usize {
        self.source
    }

    /// Second endpoint of the input edge.
    #[must_use]
    pub const fn target(&self) -> usize {
        self.target
    }
}

/// A binary hierarchy whose internal node `num_leaves() + k` was created by
/// merge edge `k`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "PartitionParts", into = "PartitionParts")
)]
pub struct BinaryPartitionTree {
    hierarchy: Hierarchy,
    merge_edges: Vec<MergeEdge>,
}

impl BinaryPartitionTree {
    /// Pairs a hierarchy with the edges that created its internal nodes.
    ///
    /// # Errors
    /// Returns [`HierarchyError::NotBinary`] when an internal node does not
    /// have two children and [`HierarchyError::MergeEdgeCount`] when there is
    /// not one merge edge per internal node.
    pub fn new(hierarchy: Hierarchy, merge_edges: Vec<MergeEdge>) -> Result<Self, HierarchyError> {
        let tree = hierarchy.tree();
        if let Some(node) = tree
            .internal_nodes()
            .find(|&node| tree.children(node).len() != 2)
        {
            return Err(HierarchyError::NotBinary {
                node,
                children: tree.children(node).len(),
            });
        }
        let expected = tree.internal_nodes().len();
        if merge_edges.len() != expected {
            return Err(HierarchyError::MergeEdgeCount {
                expected,
                got: merge_edges.len(),
            });
        }
        Ok(Self {
            hierarchy,
            merge_edges,
        })
    }

    /// Assembles a tree from builder output that is binary by construction.
    fn assemble(
        parents: Vec<usize>,
        altitudes: Vec<f64>,
        merge_edges: Vec<MergeEdge>,
    ) -> Result<Self, HierarchyError> {
        let tree = Tree::from_parents(parents)?;
        let hierarchy = Hierarchy::new(tree, altitudes)?;
        Ok(Self {
            hierarchy,
            merge_edges,
        })
    }

    /// The hierarchy.
    #[must_use]
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// The tree.
    #[must_use]
    pub fn tree(&self) -> &Tree {
        self.hierarchy.tree()
    }

    /// Node altitudes.
    #[must_use]
    pub fn altitudes(&self) -> &[f64] {
        self.hierarchy.altitudes()
    }

    /// One merge edge per internal node, in node order.
    #[must_use]
    pub fn merge_edges(&self) -> &[MergeEdge] {
        &self.merge_edges
    }

    /// Consumes the tree, keeping the hierarchy.
    #[must_use]
    pub fn into_hierarchy(self) -> Hierarchy {
        self.hierarchy
    }
}

#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct PartitionParts {
    hierarchy: Hierarchy,
    merge_edges: Vec<MergeEdge>,
}

#[cfg(feature = "serde")]
impl TryFrom<PartitionParts> for BinaryPartitionTree {
    type Error = HierarchyError;

    fn try_from(parts: PartitionParts) -> Result<Self, Self::Error> {
        Self::new(parts.hierarchy, parts.merge_edges)
    }
}

#[cfg(feature = "serde")]
impl From<BinaryPartitionTree> for PartitionParts {
    fn from(tree: BinaryPartitionTree) -> Self {
        Self {
            hierarchy: tree.hierarchy,
            merge_edges: tree.merge_edges,
        }
    }
}
