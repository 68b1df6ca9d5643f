//! Segmentation pipeline: fine graph to region hierarchy.
//!
//! A run labels the fine graph into initial regions, contracts the labels into
//! a region adjacency graph, folds the fine edge weights onto the region
//! boundaries and agglomerates the regions into a binary partition tree. An
//! optional criterion then re-ranks the tree into a watershed hierarchy.

#[cfg(feature = "serde")]
use serde::Serialize;
use tracing::{debug, instrument};

use crate::{
    Result,
    accumulator::{Counter, Max, Mean, Min},
    builder::{LabellingStrategy, PipelineBuilder},
    graph::{EdgeGraph, validate_edge_weights},
    hierarchy::{
        AverageLinkage, BinaryPartitionTree, CompleteLinkage, Criterion, LinkageKind,
        SingleLinkage, binary_partition_tree, watershed_hierarchy,
    },
    labelling::{Keep, Labelling, threshold_labels, watershed_labels},
    rag::RegionAdjacencyGraph,
    tree::Hierarchy,
};

/// A configured segmentation pipeline.
///
/// # Examples
/// ```
/// use dendra_core::{PipelineBuilder, UndirectedGraph};
///
/// let graph = UndirectedGraph::with_edges(4, [(0, 1), (1, 2), (2, 3)])?;
/// let pipeline = PipelineBuilder::new().build()?;
/// let segmentation = pipeline.run(&graph, &[0.0, 5.0, 1.0])?;
/// assert_eq!(segmentation.labelling().labels(), &[0, 0, 1, 1]);
/// assert_eq!(segmentation.hierarchy().tree().parents(), &[2, 2, 2]);
/// assert_eq!(segmentation.hierarchy().altitudes(), &[0.0, 0.0, 5.0]);
/// # Ok::<(), dendra_core::DendraError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Pipeline {
    linkage: LinkageKind,
    criterion: Option<Criterion>,
    labelling: LabellingStrategy,
}

impl Pipeline {
    pub(crate) fn new(
        linkage: LinkageKind,
        criterion: Option<Criterion>,
        labelling: LabellingStrategy,
    ) -> Self {
        Self {
            linkage,
            criterion,
            labelling,
        }
    }

    /// Returns the linkage weighing merged region boundaries.
    #[must_use]
    pub fn linkage(&self) -> LinkageKind {
        self.linkage
    }

    /// Returns the simplification criterion, if any.
    #[must_use]
    pub fn criterion(&self) -> Option<Criterion> {
        self.criterion
    }

    /// Returns the strategy producing the initial regions.
    #[must_use]
    pub fn labelling(&self) -> LabellingStrategy {
        self.labelling
    }

    /// Segments `graph` into a hierarchy of regions.
    ///
    /// Leaves of the resulting trees are the initial regions, numbered as in
    /// [`Segmentation::labelling`]. Average linkage weighs region boundaries
    /// by the mean fine edge weight, single linkage by the lightest and
    /// complete linkage by the heaviest fine edge.
    ///
    /// # Errors
    /// Returns [`crate::DendraError::Graph`] when `edge_weights` does not
    /// match the graph or holds a non-finite or negative weight on a live
    /// edge, before any stage runs, and
    /// [`crate::DendraError::Hierarchy`] when the graph is empty or
    /// disconnected.
    #[instrument(
        name = "core.run",
        err,
        skip(self, graph, edge_weights),
        fields(
            vertices = graph.vertex_count(),
            edges = graph.edge_count(),
            linkage = ?self.linkage,
            criterion = ?self.criterion,
        ),
    )]
    pub fn run<G: EdgeGraph>(&self, graph: &G, edge_weights: &[f64]) -> Result<Segmentation> {
        validate_edge_weights(graph, edge_weights)?;

        let labelling = match self.labelling {
            LabellingStrategy::Watershed => watershed_labels(graph, edge_weights)?,
            LabellingStrategy::Threshold { threshold } => {
                threshold_labels(graph, edge_weights, threshold, Keep::AtMost)?
            }
        };
        let rag = RegionAdjacencyGraph::from_labelling(graph, &labelling)?;
        debug!(
            regions = rag.region_count(),
            boundaries = rag.graph().edge_count(),
            "regions contracted"
        );

        let partition_tree = match self.linkage {
            LinkageKind::Average => {
                let means = rag.accumulate_edges(edge_weights, &Mean)?;
                let counts = rag.accumulate_edges(edge_weights, &Counter)?;
                let mut linkage = AverageLinkage::new(&means, &counts)?;
                binary_partition_tree(rag.graph(), &means, &mut linkage)?
            }
            LinkageKind::Single => {
                let lightest = rag.accumulate_edges(edge_weights, &Min)?;
                let mut linkage = SingleLinkage::new(&lightest);
                binary_partition_tree(rag.graph(), &lightest, &mut linkage)?
            }
            LinkageKind::Complete => {
                let heaviest = rag.accumulate_edges(edge_weights, &Max)?;
                let mut linkage = CompleteLinkage::new(&heaviest);
                binary_partition_tree(rag.graph(), &heaviest, &mut linkage)?
            }
        };

        let hierarchy = match self.criterion {
            Some(criterion) => watershed_hierarchy(&partition_tree, &criterion)?,
            None => partition_tree.hierarchy().clone(),
        };

        Ok(Segmentation {
            labelling,
            rag,
            partition_tree,
            hierarchy,
        })
    }
}

/// Every stage output of a [`Pipeline::run`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Segmentation {
    labelling: Labelling,
    rag: RegionAdjacencyGraph,
    partition_tree: BinaryPartitionTree,
    hierarchy: Hierarchy,
}

impl Segmentation {
    /// Initial regions of the fine vertices.
    #[must_use]
    pub fn labelling(&self) -> &Labelling {
        &self.labelling
    }

    /// Region adjacency graph built from [`Segmentation::labelling`].
    #[must_use]
    pub fn rag(&self) -> &RegionAdjacencyGraph {
        &self.rag
    }

    /// Binary partition tree over the regions.
    #[must_use]
    pub fn partition_tree(&self) -> &BinaryPartitionTree {
        &self.partition_tree
    }

    /// The simplified hierarchy when a criterion was configured, otherwise
    /// the hierarchy of [`Segmentation::partition_tree`].
    #[must_use]
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Returns the final hierarchy, dropping the intermediate stages.
    #[must_use]
    pub fn into_hierarchy(self) -> Hierarchy {
        self.hierarchy
    }
}

/// Runs the default pipeline: watershed regions merged by average linkage
/// over mean boundary weights.
///
/// # Errors
/// See [`Pipeline::run`].
pub fn mean_boundary_hierarchy<G: EdgeGraph>(
    graph: &G,
    edge_weights: &[f64],
) -> Result<Segmentation> {
    PipelineBuilder::new().build()?.run(graph, edge_weights)
}
