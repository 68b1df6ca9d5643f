//! Vertex labellings: watershed basins by flooding and connected components
//! of thresholded graphs.
//!
//! Every labelling returned here is contiguous in `0..label_count()` and
//! numbered by the first vertex carrying each label, so results do not depend
//! on union-find internals.

use tracing::{debug, instrument};

use crate::{
    error::GraphError,
    graph::{EdgeGraph, validate_edge_weights},
    union_find::DisjointSet,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One label per vertex, contiguous in `0..label_count()`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Labelling {
    labels: Vec<usize>,
    label_count: usize,
}

impl Labelling {
    /// Renumbers arbitrary per-vertex keys by first occurrence.
    fn from_keys(keys: impl IntoIterator<Item = usize>, key_space: usize) -> Self {
        let mut relabel = vec![None; key_space];
        let mut label_count = 0;
        let labels = keys
            .into_iter()
            .map(|key| {
                *relabel[key].get_or_insert_with(|| {
                    label_count += 1;
                    label_count - 1
                })
            })
            .collect();
        Self {
            labels,
            label_count,
        }
    }

    /// Label of every vertex.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Number of distinct labels.
    #[must_use]
    pub fn label_count(&self) -> usize {
        self.label_count
    }

    /// Consumes the labelling.
    #[must_use]
    pub fn into_labels(self) -> Vec<usize> {
        self.labels
    }
}

/// Which side of the threshold an edge must fall on to stay in the graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Keep {
    /// Keep edges whose weight is at most the threshold.
    #[default]
    AtMost,
    /// Keep edges whose weight is at least the threshold.
    AtLeast,
}

/// Partitions the vertices into watershed basins by flooding from the
/// regional minima of the edge weights.
///
/// Each minimum plateau seeds its own basin. Edges are then processed by
/// increasing weight (ties by index); an edge joining two different basins is
/// a divide and leaves them apart. Vertices never reached by a basin, such as
/// isolated vertices, get a label of their own.
///
/// # Errors
/// Returns [`GraphError::LengthMismatch`] when `edge_weights` does not have
/// one entry per edge slot, [`GraphError::NonFiniteWeight`] for NaN or
/// infinite weights on live edges and [`GraphError::NegativeWeight`] for
/// weights below zero.
///
/// # Examples
/// ```
/// use dendra_core::{UndirectedGraph, watershed_labels};
///
/// let graph = UndirectedGraph::with_edges(4, [(0, 1), (1, 2), (2, 3)])?;
/// let labelling = watershed_labels(&graph, &[0.0, 5.0, 1.0])?;
/// assert_eq!(labelling.labels(), &[0, 0, 1, 1]);
/// # Ok::<(), dendra_core::GraphError>(())
/// ```
#[instrument(
    name = "core.watershed_labels",
    err,
    skip(graph, edge_weights),
    fields(vertices = graph.vertex_count(), edges = graph.edge_count()),
)]
pub fn watershed_labels<G: EdgeGraph>(
    graph: &G,
    edge_weights: &[f64],
) -> Result<Labelling, GraphError> {
    validate_edge_weights(graph, edge_weights)?;
    let vertex_count = graph.vertex_count();

    let mut lowest = vec![f64::INFINITY; vertex_count];
    for (index, edge) in graph.edges() {
        for vertex in [edge.source(), edge.target()] {
            lowest[vertex] = lowest[vertex].min(edge_weights[index]);
        }
    }

    // Plateaus: components of edges sitting at the lowest level of both ends.
    let mut sets = DisjointSet::new(vertex_count);
    for (index, edge) in graph.edges() {
        let weight = edge_weights[index];
        if weight == lowest[edge.source()] && weight == lowest[edge.target()] {
            sets.union(edge.source(), edge.target());
        }
    }

    // A plateau is a minimum unless one of its level edges leads lower.
    let mut is_minimum: Vec<bool> = lowest.iter().map(|level| level.is_finite()).collect();
    for (index, edge) in graph.edges() {
        let weight = edge_weights[index];
        for (near, far) in [
            (edge.source(), edge.target()),
            (edge.target(), edge.source()),
        ] {
            if weight == lowest[near] && lowest[far] < weight {
                let root = sets.find(near);
                is_minimum[root] = false;
            }
        }
    }

    let mut basin: Vec<Option<usize>> = vec![None; vertex_count];
    let mut basin_count = 0;
    for vertex in 0..vertex_count {
        let root = sets.find(vertex);
        if is_minimum[root] && basin[root].is_none() {
            basin[root] = Some(basin_count);
            basin_count += 1;
        }
    }

    let mut order: Vec<(usize, f64)> = graph
        .edges()
        .map(|(index, _)| (index, edge_weights[index]))
        .collect();
    order.sort_by(|left, right| left.1.total_cmp(&right.1).then(left.0.cmp(&right.0)));

    let mut divides = 0_usize;
    for (index, _) in order {
        let Some(edge) = graph.edge(index) else {
            continue;
        };
        let left = sets.find(edge.source());
        let right = sets.find(edge.target());
        if left == right {
            continue;
        }
        if basin[left].is_some() && basin[right].is_some() {
            divides += 1;
            continue;
        }
        let label = basin[left].or(basin[right]);
        let root = sets.union_roots(left, right);
        basin[root] = label;
    }

    debug!(basins = basin_count, divides, "flooding complete");
    #[cfg(feature = "metrics")]
    metrics::counter!("watershed_divides_total").increment(divides as u64);

    // Unreached components are keyed past the basin range.
    let keys: Vec<usize> = (0..vertex_count)
        .map(|vertex| {
            let root = sets.find(vertex);
            basin[root].unwrap_or(basin_count + root)
        })
        .collect();
    Ok(Labelling::from_keys(keys, basin_count + vertex_count))
}

/// Labels the connected components of the graph restricted to the edges
/// whose weight lies on the `keep` side of `threshold`.
///
/// # Errors
/// Returns [`GraphError::LengthMismatch`] when `edge_weights` does not have
/// one entry per edge slot.
pub fn threshold_labels<G: EdgeGraph>(
    graph: &G,
    edge_weights: &[f64],
    threshold: f64,
    keep: Keep,
) -> Result<Labelling, GraphError> {
    crate::graph::check_length("edge weights", graph.edge_count(), edge_weights.len())?;
    Ok(component_labels(graph, |edge| match keep {
        Keep::AtMost => edge_weights[edge] <= threshold,
        Keep::AtLeast => edge_weights[edge] >= threshold,
    }))
}

/// Labels the connected components of the graph restricted to the live edges
/// accepted by `keep`.
pub fn component_labels<G, F>(graph: &G, mut keep: F) -> Labelling
where
    G: EdgeGraph,
    F: FnMut(usize) -> bool,
{
    let vertex_count = graph.vertex_count();
    let mut sets = DisjointSet::new(vertex_count);
    for (index, edge) in graph.edges() {
        if keep(index) {
            sets.union(edge.source(), edge.target());
        }
    }
    let keys: Vec<usize> = (0..vertex_count).map(|vertex| sets.find(vertex)).collect();
    Labelling::from_keys(keys, vertex_count)
}
