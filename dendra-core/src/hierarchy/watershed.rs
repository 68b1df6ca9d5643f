//! Watershed hierarchies: canonical trees re-weighted by basin significance.
//!
//! Every internal node of a canonical tree holding a regional minimum is a
//! basin that disappears when merged into a deeper one. The merge edge is
//! re-weighted with the significance of the weaker basin, so the rebuilt
//! hierarchy orders merges by how meaningful the lost basin was rather than by
//! the raw edge weight.

use tracing::{debug, instrument};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    graph::{EdgeGraph, UndirectedGraph},
    tree::{
        Hierarchy, Tree, attribute_area, attribute_depth, attribute_dynamics, attribute_minima,
        attribute_volume,
    },
};

use super::{BinaryPartitionTree, HierarchyError, bpt_canonical};

/// Node attributes available to a [`Significance`].
#[derive(Clone, Copy, Debug)]
pub struct SignificanceContext<'a> {
    hierarchy: &'a Hierarchy,
    area: &'a [f64],
    minima: &'a [bool],
    depth: &'a [f64],
}

impl<'a> SignificanceContext<'a> {
    /// The canonical tree being ranked.
    #[must_use]
    pub fn hierarchy(&self) -> &'a Hierarchy {
        self.hierarchy
    }

    /// The tree.
    #[must_use]
    pub fn tree(&self) -> &'a Tree {
        self.hierarchy.tree()
    }

    /// Node altitudes.
    #[must_use]
    pub fn altitudes(&self) -> &'a [f64] {
        self.hierarchy.altitudes()
    }

    /// Leaf count below each node.
    #[must_use]
    pub fn area(&self) -> &'a [f64] {
        self.area
    }

    /// Whether each node is a regional minimum.
    #[must_use]
    pub fn minima(&self) -> &'a [bool] {
        self.minima
    }

    /// Altitude of the lowest minimum below each node, `+inf` when none.
    #[must_use]
    pub fn depth(&self) -> &'a [f64] {
        self.depth
    }
}

/// Scores tree nodes; higher scores mark more significant basins.
pub trait Significance {
    /// Returns one score per node of `context.tree()`.
    fn scores(&self, context: &SignificanceContext<'_>) -> Vec<f64>;
}

/// Basin size in leaves.
#[derive(Clone, Copy, Debug, Default)]
pub struct Area;

/// Basin volume: area times altitude gap, summed over the subtree.
#[derive(Clone, Copy, Debug, Default)]
pub struct Volume;

/// Basin depth below the level at which it merges into a deeper basin.
#[derive(Clone, Copy, Debug, Default)]
pub struct Dynamics;

impl Significance for Area {
    fn scores(&self, context: &SignificanceContext<'_>) -> Vec<f64> {
        context.area().to_vec()
    }
}

impl Significance for Volume {
    fn scores(&self, context: &SignificanceContext<'_>) -> Vec<f64> {
        attribute_volume(context.hierarchy(), context.area())
    }
}

impl Significance for Dynamics {
    fn scores(&self, context: &SignificanceContext<'_>) -> Vec<f64> {
        attribute_dynamics(context.hierarchy(), context.depth())
    }
}

/// Built-in significance attributes selectable by configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Criterion {
    /// See [`Area`].
    Area,
    /// See [`Dynamics`].
    Dynamics,
    /// See [`Volume`].
    Volume,
}

impl Significance for Criterion {
    fn scores(&self, context: &SignificanceContext<'_>) -> Vec<f64> {
        match self {
            Self::Area => Area.scores(context),
            Self::Dynamics => Dynamics.scores(context),
            Self::Volume => Volume.scores(context),
        }
    }
}

/// Re-weights the merge edges of `partition` by basin significance and
/// returns the canonized hierarchy built over them.
///
/// `partition` should be a canonical tree such as the one returned by
/// [`bpt_canonical`]. Leaves of the result are the leaves of `partition`.
///
/// # Errors
/// Returns [`HierarchyError::ScoreLengthMismatch`] when `significance` does
/// not score every node.
#[instrument(
    name = "core.watershed_hierarchy",
    err,
    skip(partition, significance),
    fields(leaves = partition.tree().num_leaves()),
)]
pub fn watershed_hierarchy<S>(
    partition: &BinaryPartitionTree,
    significance: &S,
) -> Result<Hierarchy, HierarchyError>
where
    S: Significance + ?Sized,
{
    let hierarchy = partition.hierarchy();
    let tree = hierarchy.tree();
    let altitudes = hierarchy.altitudes();
    let area = attribute_area(tree);
    let minima = attribute_minima(hierarchy);
    let depth = attribute_depth(hierarchy, &minima);
    let context = SignificanceContext {
        hierarchy,
        area: &area,
        minima: &minima,
        depth: &depth,
    };
    let scores = significance.scores(&context);
    if scores.len() != tree.node_count() {
        return Err(HierarchyError::ScoreLengthMismatch {
            expected: tree.node_count(),
            got: scores.len(),
        });
    }

    // Nodes inside a plateau pass up the strongest basin below them.
    let mut persistence = vec![0.0_f64; tree.node_count()];
    for node in tree.internal_nodes() {
        let parent = tree.parent(node);
        persistence[node] = if parent != node && altitudes[parent] == altitudes[node] {
            tree.children(node)
                .iter()
                .map(|&child| persistence[child])
                .fold(f64::NEG_INFINITY, f64::max)
        } else if depth[node].is_finite() {
            scores[node]
        } else {
            0.0
        };
    }

    let leaves = tree.num_leaves();
    let mut graph = UndirectedGraph::new(leaves);
    let mut weights = Vec::with_capacity(partition.merge_edges().len());
    for (offset, merge) in partition.merge_edges().iter().enumerate() {
        graph.add_edge(merge.source(), merge.target())?;
        let node = leaves + offset;
        let weight = tree
            .children(node)
            .iter()
            .map(|&child| persistence[child])
            .fold(f64::INFINITY, f64::min);
        weights.push(weight);
    }
    debug!(basins = minima.iter().filter(|&&is_min| is_min).count(), "basins ranked");

    let reweighted = bpt_canonical(&graph, &weights)?;
    Ok(reweighted.into_hierarchy().canonize())
}

/// Watershed hierarchy of `graph` ranked by basin area.
///
/// # Errors
/// See [`bpt_canonical`].
pub fn watershed_hierarchy_by_area<G: EdgeGraph>(
    graph: &G,
    edge_weights: &[f64],
) -> Result<Hierarchy, HierarchyError> {
    watershed_hierarchy(&bpt_canonical(graph, edge_weights)?, &Area)
}

/// Watershed hierarchy of `graph` ranked by basin dynamics.
///
/// # Errors
/// See [`bpt_canonical`].
pub fn watershed_hierarchy_by_dynamics<G: EdgeGraph>(
    graph: &G,
    edge_weights: &[f64],
) -> Result<Hierarchy, HierarchyError> {
    watershed_hierarchy(&bpt_canonical(graph, edge_weights)?, &Dynamics)
}

/// Watershed hierarchy of `graph` ranked by basin volume.
///
/// # Errors
/// See [`bpt_canonical`].
pub fn watershed_hierarchy_by_volume<G: EdgeGraph>(
    graph: &G,
    edge_weights: &[f64],
) -> Result<Hierarchy, HierarchyError> {
    watershed_hierarchy(&bpt_canonical(graph, edge_weights)?, &Volume)
}
