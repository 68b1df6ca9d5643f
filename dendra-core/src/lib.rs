//! Dendra core library: hierarchical segmentation of edge-weighted graphs.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod accumulator;
mod builder;
mod error;
mod graph;
mod hierarchy;
mod labelling;
mod pipeline;
mod rag;
#[cfg(test)]
mod test_utils;
mod tree;
mod union_find;

pub use crate::{
    accumulator::{
        ArgMax, ArgMin, Counter, Max, Mean, Min, Reducer, Sum, accumulate, accumulate_children,
        accumulate_sequential,
    },
    builder::{LabellingStrategy, PipelineBuilder},
    error::{
        AccumulateError, AccumulateErrorCode, DendraError, DendraErrorCode, GraphError,
        GraphErrorCode, Result, TreeError, TreeErrorCode,
    },
    graph::{
        Edge, EdgeGraph, UndirectedGraph, four_adjacency_edge_count, four_adjacency_edges,
    },
    hierarchy::{
        Area, AverageLinkage, BinaryPartitionTree, CompleteLinkage, Criterion, Dynamics,
        HierarchyError, HierarchyErrorCode, Linkage, LinkageKind, MergeEdge, MergeNeighbour,
        RegionMerge, Significance, SignificanceContext, SingleLinkage, Volume,
        binary_partition_tree, bpt_canonical, watershed_hierarchy, watershed_hierarchy_by_area,
        watershed_hierarchy_by_dynamics, watershed_hierarchy_by_volume,
    },
    labelling::{Keep, Labelling, component_labels, threshold_labels, watershed_labels},
    pipeline::{Pipeline, Segmentation, mean_boundary_hierarchy},
    rag::RegionAdjacencyGraph,
    tree::{
        Hierarchy, SimplifiedTree, Tree, attribute_area, attribute_depth, attribute_dynamics,
        attribute_minima, attribute_volume, simplify_tree,
    },
    union_find::DisjointSet,
};
