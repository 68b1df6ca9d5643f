//! Undirected edge-indexed graphs.
//!
//! Every algorithm in the crate consumes graphs through [`EdgeGraph`]. Edges
//! are addressed by a stable index: removing an edge leaves a tombstone in its
//! slot so attribute arrays indexed by edge stay aligned with the graph.

use crate::error::GraphError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An undirected edge between two vertices.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Edge {
    source: usize,
    target: usize,
}

impl Edge {
    /// Creates an edge joining `source` and `target`.
    #[must_use]
    pub const fn new(source: usize, target: usize) -> Self {
        Self { source, target }
    }

    /// First endpoint as supplied at insertion.
    #[must_use]
    pub const fn source(&self) -> usize {
        self.source
    }

    /// Second endpoint as supplied at insertion.
    #[must_use]
    pub const fn target(&self) -> usize {
        self.target
    }

    /// Returns the endpoint opposite `vertex`.
    ///
    /// For a vertex that is not an endpoint the source is returned.
    #[must_use]
    pub const fn opposite(&self, vertex: usize) -> usize {
        if self.source == vertex {
            self.target
        } else {
            self.source
        }
    }
}

/// Read access to an undirected graph with stable edge indices.
pub trait EdgeGraph {
    /// Number of vertices; vertex ids are `0..vertex_count()`.
    fn vertex_count(&self) -> usize;

    /// Number of edge slots, including removed edges.
    fn edge_count(&self) -> usize;

    /// Returns the edge stored at `edge`, or `None` when the index is out of
    /// range or the edge was removed.
    fn edge(&self, edge: usize) -> Option<Edge>;

    /// Live edges incident to `vertex`, in insertion order. Out-of-range
    /// vertices have no incident edges.
    fn incident_edges(&self, vertex: usize) -> &[usize];

    /// Whether `edge` is in range and has not been removed.
    fn is_edge_live(&self, edge: usize) -> bool {
        self.edge(edge).is_some()
    }

    /// Iterates over the live edges with their indices, in index order.
    fn edges(&self) -> impl Iterator<Item = (usize, Edge)> + '_
    where
        Self: Sized,
    {
        (0..self.edge_count()).filter_map(move |index| self.edge(index).map(|edge| (index, edge)))
    }
}

/// Adjacency-list graph with an edge arena.
///
/// # Examples
/// ```
/// use dendra_core::{EdgeGraph, UndirectedGraph};
///
/// let mut graph = UndirectedGraph::new(3);
/// let first = graph.add_edge(0, 1)?;
/// graph.add_edge(1, 2)?;
/// graph.remove_edge(first)?;
/// assert_eq!(graph.edge_count(), 2);
/// assert_eq!(graph.live_edge_count(), 1);
/// assert!(!graph.is_edge_live(first));
/// # Ok::<(), dendra_core::GraphError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UndirectedGraph {
    edges: Vec<Option<Edge>>,
    incidence: Vec<Vec<usize>>,
}

impl UndirectedGraph {
    /// Creates a graph with `vertex_count` isolated vertices.
    #[must_use]
    pub fn new(vertex_count: usize) -> Self {
        Self {
            edges: Vec::new(),
            incidence: vec![Vec::new(); vertex_count],
        }
    }

    /// Creates a graph from `(source, target)` pairs, assigning edge indices
    /// in iteration order.
    ///
    /// # Errors
    /// Returns [`GraphError::VertexOutOfRange`] when a pair names a vertex
    /// outside `0..vertex_count`.
    pub fn with_edges<I>(vertex_count: usize, pairs: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut graph = Self::new(vertex_count);
        for (source, target) in pairs {
            graph.add_edge(source, target)?;
        }
        Ok(graph)
    }

    /// Appends an isolated vertex and returns its id.
    pub fn add_vertex(&mut self) -> usize {
        self.incidence.push(Vec::new());
        self.incidence.len() - 1
    }

    /// Appends an edge and returns its index.
    ///
    /// # Errors
    /// Returns [`GraphError::VertexOutOfRange`] when either endpoint is not a
    /// vertex of the graph.
    pub fn add_edge(&mut self, source: usize, target: usize) -> Result<usize, GraphError> {
        let vertex_count = self.incidence.len();
        for vertex in [source, target] {
            if vertex >= vertex_count {
                return Err(GraphError::VertexOutOfRange {
                    vertex,
                    vertex_count,
                });
            }
        }
        Ok(self.push_edge(source, target))
    }

    /// Creates the 4-adjacency graph of a `rows x cols` image, with edges
    /// ordered as [`four_adjacency_edges`] lists them.
    ///
    /// # Examples
    /// ```
    /// use dendra_core::{EdgeGraph, UndirectedGraph};
    ///
    /// let grid = UndirectedGraph::four_adjacency(2, 3);
    /// assert_eq!(grid.vertex_count(), 6);
    /// assert_eq!(grid.edge_count(), 7);
    /// ```
    #[must_use]
    pub fn four_adjacency(rows: usize, cols: usize) -> Self {
        let mut graph = Self::new(rows * cols);
        for (source, target) in four_adjacency_edges(rows, cols) {
            graph.push_edge(source, target);
        }
        graph
    }

    // Endpoints must already be vertices.
    fn push_edge(&mut self, source: usize, target: usize) -> usize {
        let index = self.edges.len();
        self.edges.push(Some(Edge::new(source, target)));
        self.incidence[source].push(index);
        if source != target {
            self.incidence[target].push(index);
        }
        index
    }

    /// Removes the edge at `edge`, keeping its slot so later indices are
    /// unchanged. Removing an already removed edge is a no-op.
    ///
    /// # Errors
    /// Returns [`GraphError::EdgeOutOfRange`] when `edge` was never allocated.
    pub fn remove_edge(&mut self, edge: usize) -> Result<(), GraphError> {
        let edge_count = self.edges.len();
        let slot = self
            .edges
            .get_mut(edge)
            .ok_or(GraphError::EdgeOutOfRange { edge, edge_count })?;
        if let Some(removed) = slot.take() {
            for vertex in [removed.source(), removed.target()] {
                self.incidence[vertex].retain(|&incident| incident != edge);
            }
        }
        Ok(())
    }

    /// Number of edges that have not been removed.
    #[must_use]
    pub fn live_edge_count(&self) -> usize {
        self.edges.iter().flatten().count()
    }
}

impl EdgeGraph for UndirectedGraph {
    fn vertex_count(&self) -> usize {
        self.incidence.len()
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn edge(&self, edge: usize) -> Option<Edge> {
        self.edges.get(edge).copied().flatten()
    }

    fn incident_edges(&self, vertex: usize) -> &[usize] {
        self.incidence.get(vertex).map_or(&[], Vec::as_slice)
    }
}

/// Edges of a `rows x cols` 4-adjacency grid in row-major order: the
/// horizontal edges of a row come before the vertical edges leaving it.
///
/// # Examples
/// ```
/// use dendra_core::four_adjacency_edges;
///
/// assert_eq!(four_adjacency_edges(1, 3), vec![(0, 1), (1, 2)]);
/// assert_eq!(four_adjacency_edges(2, 2), vec![(0, 1), (0, 2), (1, 3), (2, 3)]);
/// ```
#[must_use]
pub fn four_adjacency_edges(rows: usize, cols: usize) -> Vec<(usize, usize)> {
    let mut edges = Vec::with_capacity(four_adjacency_edge_count(rows, cols).unwrap_or(0));
    for row in 0..rows {
        let start = row * cols;
        edges.extend((1..cols).map(|col| (start + col - 1, start + col)));
        if row + 1 < rows {
            edges.extend((0..cols).map(|col| (start + col, start + cols + col)));
        }
    }
    edges
}

/// Number of edges of a `rows x cols` 4-adjacency grid, or `None` when it
/// does not fit in a `usize`.
#[must_use]
pub fn four_adjacency_edge_count(rows: usize, cols: usize) -> Option<usize> {
    let horizontal = rows.checked_mul(cols.saturating_sub(1))?;
    let vertical = rows.saturating_sub(1).checked_mul(cols)?;
    horizontal.checked_add(vertical)
}

/// Checks that `weights` has one entry per edge slot and that every live edge
/// carries a finite, non-negative weight.
///
/// Leaves of every hierarchy sit at altitude zero, so a negative edge would
/// place a merge below its children.
pub(crate) fn validate_edge_weights<G: EdgeGraph>(
    graph: &G,
    weights: &[f64],
) -> Result<(), GraphError> {
    check_length("edge weights", graph.edge_count(), weights.len())?;
    for (index, _) in graph.edges() {
        let weight = weights[index];
        if !weight.is_finite() {
            return Err(GraphError::NonFiniteWeight {
                edge: index,
                weight,
            });
        }
        if weight < 0.0 {
            return Err(GraphError::NegativeWeight {
                edge: index,
                weight,
            });
        }
    }
    Ok(())
}

pub(crate) fn check_length(
    what: &'static str,
    expected: usize,
    got: usize,
) -> Result<(), GraphError> {
    if expected == got {
        Ok(())
    } else {
        Err(GraphError::LengthMismatch {
            what,
            expected,
            got,
        })
    }
}
