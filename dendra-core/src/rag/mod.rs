//! Region adjacency graphs: contraction of a labelled graph into one vertex
//! per label and one edge per pair of touching labels.

use std::collections::HashMap;

use tracing::{debug, instrument};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    accumulator::{Reducer, accumulate},
    error::{AccumulateError, GraphError},
    graph::{EdgeGraph, UndirectedGraph, check_length},
    labelling::Labelling,
};

/// A contracted graph together with the maps back to the graph it came from.
///
/// # Examples
/// ```
/// use dendra_core::{EdgeGraph, RegionAdjacencyGraph, UndirectedGraph};
///
/// let graph = UndirectedGraph::with_edges(4, [(0, 1), (1, 2), (2, 3), (3, 0)])?;
/// let rag = RegionAdjacencyGraph::from_labels(&graph, &[7, 7, 3, 3])?;
/// assert_eq!(rag.region_count(), 2);
/// assert_eq!(rag.graph().edge_count(), 1);
/// assert_eq!(rag.edge_map(), &[None, Some(0), None, Some(0)]);
/// # Ok::<(), dendra_core::GraphError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegionAdjacencyGraph {
    graph: UndirectedGraph,
    vertex_map: Vec<usize>,
    edge_map: Vec<Option<usize>>,
}

impl RegionAdjacencyGraph {
    /// Contracts `graph` by `labels`, one label per vertex.
    ///
    /// Labels may be any values; regions are numbered by the first vertex
    /// carrying each label. Edges inside a region and removed edges map to
    /// `None`.
    ///
    /// # Errors
    /// Returns [`GraphError::LengthMismatch`] unless there is one label per
    /// vertex.
    #[instrument(
        name = "core.region_adjacency_graph",
        err,
        skip(graph, labels),
        fields(vertices = graph.vertex_count(), edges = graph.edge_count()),
    )]
    pub fn from_labels<G: EdgeGraph>(graph: &G, labels: &[usize]) -> Result<Self, GraphError> {
        check_length("vertex labels", graph.vertex_count(), labels.len())?;

        let mut regions: HashMap<usize, usize> = HashMap::new();
        let vertex_map: Vec<usize> = labels
            .iter()
            .map(|&label| {
                let next = regions.len();
                *regions.entry(label).or_insert(next)
            })
            .collect();

        let mut rag = UndirectedGraph::new(regions.len());
        let mut existing: HashMap<(usize, usize), usize> = HashMap::new();
        let mut edge_map = Vec::with_capacity(graph.edge_count());
        for index in 0..graph.edge_count() {
            let Some(edge) = graph.edge(index) else {
                edge_map.push(None);
                continue;
            };
            let source = vertex_map[edge.source()];
            let target = vertex_map[edge.target()];
            if source == target {
                edge_map.push(None);
                continue;
            }
            let key = (source.min(target), source.max(target));
            let rag_edge = match existing.get(&key) {
                Some(&rag_edge) => rag_edge,
                None => {
                    let rag_edge = rag.add_edge(key.0, key.1)?;
                    existing.insert(key, rag_edge);
                    rag_edge
                }
            };
            edge_map.push(Some(rag_edge));
        }

        debug!(
            regions = rag.vertex_count(),
            region_edges = rag.edge_count(),
            "region adjacency graph built"
        );
        Ok(Self {
            graph: rag,
            vertex_map,
            edge_map,
        })
    }

    /// Contracts `graph` by a [`Labelling`].
    ///
    /// # Errors
    /// See [`RegionAdjacencyGraph::from_labels`].
    pub fn from_labelling<G: EdgeGraph>(
        graph: &G,
        labelling: &Labelling,
    ) -> Result<Self, GraphError> {
        Self::from_labels(graph, labelling.labels())
    }

    /// The contracted graph.
    #[must_use]
    pub fn graph(&self) -> &UndirectedGraph {
        &self.graph
    }

    /// Number of regions.
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.graph.vertex_count()
    }

    /// Region of every original vertex.
    #[must_use]
    pub fn vertex_map(&self) -> &[usize] {
        &self.vertex_map
    }

    /// Region edge of every original edge slot, `None` for edges inside a
    /// region and for removed edges.
    #[must_use]
    pub fn edge_map(&self) -> &[Option<usize>] {
        &self.edge_map
    }

    /// Copies each region's value onto every original vertex of the region.
    ///
    /// # Errors
    /// Returns [`GraphError::LengthMismatch`] unless there is one value per
    /// region.
    pub fn back_project_vertex_weights<T: Clone>(
        &self,
        region_values: &[T],
    ) -> Result<Vec<T>, GraphError> {
        check_length("region values", self.region_count(), region_values.len())?;
        Ok(self
            .vertex_map
            .iter()
            .map(|&region| region_values[region].clone())
            .collect())
    }

    /// Copies each region edge's value onto the original edges it gathers;
    /// edges without a region edge receive `default`.
    ///
    /// # Errors
    /// Returns [`GraphError::LengthMismatch`] unless there is one value per
    /// region edge.
    pub fn back_project_edge_weights<T: Clone>(
        &self,
        region_edge_values: &[T],
        default: T,
    ) -> Result<Vec<T>, GraphError> {
        check_length(
            "region edge values",
            self.graph.edge_count(),
            region_edge_values.len(),
        )?;
        Ok(self
            .edge_map
            .iter()
            .map(|rag_edge| match *rag_edge {
                Some(rag_edge) => region_edge_values[rag_edge].clone(),
                None => default.clone(),
            })
            .collect())
    }

    /// Reduces per-vertex values onto regions.
    ///
    /// # Errors
    /// Returns [`AccumulateError::LengthMismatch`] unless there is one value
    /// per original vertex.
    pub fn accumulate_vertices<R: Reducer>(
        &self,
        vertex_values: &[f64],
        reducer: &R,
    ) -> Result<Vec<R::Output>, AccumulateError> {
        let groups: Vec<Option<usize>> = self.vertex_map.iter().copied().map(Some).collect();
        accumulate(&groups, self.region_count(), vertex_values, reducer)
    }

    /// Reduces per-edge values onto region edges; internal and removed edges
    /// are dropped.
    ///
    /// # Errors
    /// Returns [`AccumulateError::LengthMismatch`] unless there is one value
    /// per original edge slot.
    pub fn accumulate_edges<R: Reducer>(
        &self,
        edge_values: &[f64],
        reducer: &R,
    ) -> Result<Vec<R::Output>, AccumulateError> {
        accumulate(&self.edge_map, self.graph.edge_count(), edge_values, reducer)
    }
}
