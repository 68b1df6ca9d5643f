//! Error types for the dendra core library.
//!
//! Defines the error enums shared by the graph, accumulation, tree and
//! pipeline layers, each paired with a stable machine-readable code.

use std::fmt;

use thiserror::Error;

use crate::hierarchy::{HierarchyError, HierarchyErrorCode};

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced while reading or mutating a graph, or while checking an
/// attribute array against it.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GraphError {
    /// A vertex id was outside `0..vertex_count`.
    #[error("vertex {vertex} is out of range for a graph with {vertex_count} vertices")]
    VertexOutOfRange {
        /// The offending vertex id.
        vertex: usize,
        /// Number of vertices in the graph.
        vertex_count: usize,
    },
    /// An edge index was outside `0..edge_count`.
    #[error("edge {edge} is out of range for a graph with {edge_count} edges")]
    EdgeOutOfRange {
        /// The offending edge index.
        edge: usize,
        /// Number of edge slots in the graph.
        edge_count: usize,
    },
    /// An attribute array did not have one entry per graph element.
    #[error("{what} has length {got} but the graph requires {expected}")]
    LengthMismatch {
        /// Which array was rejected.
        what: &'static str,
        /// Number of entries the graph requires.
        expected: usize,
        /// Number of entries supplied.
        got: usize,
    },
    /// A live edge carried a NaN or infinite weight.
    #[error("edge {edge} has non-finite weight {weight}")]
    NonFiniteWeight {
        /// Index of the offending edge.
        edge: usize,
        /// The rejected weight.
        weight: f64,
    },
    /// A live edge carried a weight below zero.
    #[error("edge {edge} has negative weight {weight}")]
    NegativeWeight {
        /// Index of the offending edge.
        edge: usize,
        /// The rejected weight.
        weight: f64,
    },
}

define_error_codes! {
    /// Stable codes describing [`GraphError`] variants.
    enum GraphErrorCode for GraphError {
        /// A vertex id was outside the graph.
        VertexOutOfRange => VertexOutOfRange { .. } => "GRAPH_VERTEX_OUT_OF_RANGE",
        /// An edge index was outside the graph.
        EdgeOutOfRange => EdgeOutOfRange { .. } => "GRAPH_EDGE_OUT_OF_RANGE",
        /// An attribute array length did not match the graph.
        LengthMismatch => LengthMismatch { .. } => "GRAPH_LENGTH_MISMATCH",
        /// A live edge carried a non-finite weight.
        NonFiniteWeight => NonFiniteWeight { .. } => "GRAPH_NON_FINITE_WEIGHT",
        /// A live edge carried a negative weight.
        NegativeWeight => NegativeWeight { .. } => "GRAPH_NEGATIVE_WEIGHT",
    }
}

/// An error produced by [`crate::accumulate`] and the tree accumulators.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum AccumulateError {
    /// The grouping and the value array had different lengths.
    #[error("expected {expected} values but got {got}")]
    LengthMismatch {
        /// Number of values required by the grouping or tree.
        expected: usize,
        /// Number of values supplied.
        got: usize,
    },
    /// A fine element was mapped to a group that does not exist.
    #[error("element {index} maps to group {group} but only {group_count} groups exist")]
    GroupOutOfRange {
        /// Index of the fine element.
        index: usize,
        /// The group it was mapped to.
        group: usize,
        /// Number of coarse groups.
        group_count: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`AccumulateError`] variants.
    enum AccumulateErrorCode for AccumulateError {
        /// The grouping and the value array had different lengths.
        LengthMismatch => LengthMismatch { .. } => "ACCUMULATE_LENGTH_MISMATCH",
        /// A fine element was mapped to a group that does not exist.
        GroupOutOfRange => GroupOutOfRange { .. } => "ACCUMULATE_GROUP_OUT_OF_RANGE",
    }
}

/// An error produced when a parent array or altitude array does not describe
/// a valid hierarchy.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TreeError {
    /// The parent array was empty.
    #[error("a tree requires at least one node")]
    Empty,
    /// A node pointed at a parent that does not come after it.
    #[error("node {node} has parent {parent}; parents must have a larger index")]
    ParentOrder {
        /// The offending node.
        node: usize,
        /// Its parent as supplied.
        parent: usize,
    },
    /// A node pointed outside the parent array.
    #[error("node {node} has parent {parent} but the tree has {node_count} nodes")]
    ParentOutOfRange {
        /// The offending node.
        node: usize,
        /// Its parent as supplied.
        parent: usize,
        /// Number of nodes in the tree.
        node_count: usize,
    },
    /// The last node was not its own parent.
    #[error("the last node {node} must be the root but has parent {parent}")]
    MissingRoot {
        /// Index of the last node.
        node: usize,
        /// Its parent as supplied.
        parent: usize,
    },
    /// A node other than the last one was its own parent.
    #[error("node {node} is a second root")]
    MultipleRoots {
        /// The extra root.
        node: usize,
    },
    /// A childless node appeared after an internal node.
    #[error("leaf {node} appears after the first internal node {first_internal}")]
    LeafAfterInternal {
        /// The misplaced leaf.
        node: usize,
        /// Index of the first internal node.
        first_internal: usize,
    },
    /// The altitude array length did not match the node count.
    #[error("altitudes have length {got} but the tree has {expected} nodes")]
    AltitudeLengthMismatch {
        /// Number of nodes in the tree.
        expected: usize,
        /// Number of altitudes supplied.
        got: usize,
    },
    /// An altitude was NaN.
    #[error("node {node} has a NaN altitude")]
    NanAltitude {
        /// The offending node.
        node: usize,
    },
    /// A node was higher than its parent.
    #[error(
        "node {node} has altitude {altitude} above its parent {parent} at {parent_altitude}"
    )]
    NonMonotonicAltitude {
        /// The offending node.
        node: usize,
        /// Its parent.
        parent: usize,
        /// Altitude of the node.
        altitude: f64,
        /// Altitude of the parent.
        parent_altitude: f64,
    },
}

define_error_codes! {
    /// Stable codes describing [`TreeError`] variants.
    enum TreeErrorCode for TreeError {
        /// The parent array was empty.
        Empty => Empty => "TREE_EMPTY",
        /// A parent index did not exceed its child's.
        ParentOrder => ParentOrder { .. } => "TREE_PARENT_ORDER",
        /// A parent index was outside the tree.
        ParentOutOfRange => ParentOutOfRange { .. } => "TREE_PARENT_OUT_OF_RANGE",
        /// The last node was not the root.
        MissingRoot => MissingRoot { .. } => "TREE_MISSING_ROOT",
        /// More than one node was its own parent.
        MultipleRoots => MultipleRoots { .. } => "TREE_MULTIPLE_ROOTS",
        /// Leaves were not a prefix of the node range.
        LeafAfterInternal => LeafAfterInternal { .. } => "TREE_LEAF_AFTER_INTERNAL",
        /// The altitude array length did not match the tree.
        AltitudeLengthMismatch => AltitudeLengthMismatch { .. } => "TREE_ALTITUDE_LENGTH_MISMATCH",
        /// An altitude was NaN.
        NanAltitude => NanAltitude { .. } => "TREE_NAN_ALTITUDE",
        /// Altitudes decreased along a leaf-to-root path.
        NonMonotonicAltitude => NonMonotonicAltitude { .. } => "TREE_NON_MONOTONIC_ALTITUDE",
    }
}

/// Error type produced when configuring or running a [`crate::Pipeline`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DendraError {
    /// The threshold labelling strategy requires a finite threshold.
    #[error("labelling threshold must be finite (got {threshold})")]
    InvalidThreshold {
        /// The rejected threshold.
        threshold: f64,
    },
    /// The input graph or one of its attribute arrays was rejected.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// Folding fine weights onto the region graph failed.
    #[error(transparent)]
    Accumulate(#[from] AccumulateError),
    /// Building or simplifying the hierarchy failed.
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}

define_error_codes! {
    /// Stable codes describing [`DendraError`] variants.
    enum DendraErrorCode for DendraError {
        /// The labelling threshold was not finite.
        InvalidThreshold => InvalidThreshold { .. } => "DENDRA_INVALID_THRESHOLD",
        /// The input graph was rejected.
        GraphFailure => Graph { .. } => "DENDRA_GRAPH_FAILURE",
        /// Accumulation onto the region graph failed.
        AccumulateFailure => Accumulate { .. } => "DENDRA_ACCUMULATE_FAILURE",
        /// Hierarchy construction failed.
        HierarchyFailure => Hierarchy { .. } => "DENDRA_HIERARCHY_FAILURE",
    }
}

impl DendraError {
    /// Retrieve the inner [`HierarchyErrorCode`] when the failure came from
    /// hierarchy construction.
    #[must_use]
    pub const fn hierarchy_code(&self) -> Option<HierarchyErrorCode> {
        match self {
            Self::Hierarchy(error) => Some(error.code()),
            _ => None,
        }
    }

    /// Retrieve the inner [`GraphErrorCode`] when the input graph was rejected,
    /// either directly or while a hierarchy was being built.
    #[must_use]
    pub const fn graph_code(&self) -> Option<GraphErrorCode> {
        match self {
            Self::Graph(error) | Self::Hierarchy(HierarchyError::Graph(error)) => {
                Some(error.code())
            }
            _ => None,
        }
    }
}

/// Convenient alias for results returned by the pipeline API.
pub type Result<T> = core::result::Result<T, DendraError>;
