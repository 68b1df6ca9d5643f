//! Canonical binary partition tree by altitude ordering.
//!
//! Edges are visited in non-decreasing weight order and every edge joining
//! two components creates a tree node, so the merge edges form a minimum
//! spanning tree and the tree is the single-linkage dendrogram of the graph.

use tracing::{instrument, warn};

use crate::{
    graph::{EdgeGraph, validate_edge_weights},
    union_find::DisjointSet,
};

use super::{BinaryPartitionTree, HierarchyError, MergeEdge};

/// Builds the canonical binary partition tree of an edge-weighted graph.
///
/// Ties between equal weights are broken by edge index. Leaves `0..n` are the
/// graph vertices.
///
/// # Errors
/// Returns [`HierarchyError::EmptyGraph`] for a graph without vertices,
/// [`HierarchyError::DisconnectedGraph`] when the graph is not connected and
/// [`HierarchyError::Graph`] when the weights are rejected: a length
/// mismatch, or a NaN, infinite or negative weight on a live edge.
///
/// # Examples
/// ```
/// use dendra_core::{UndirectedGraph, bpt_canonical};
///
/// let graph = UndirectedGraph::with_edges(3, [(0, 1), (1, 2), (0, 2)])?;
/// let tree = bpt_canonical(&graph, &[2.0, 1.0, 3.0])?;
/// assert_eq!(tree.tree().parents(), &[4, 3, 3, 4, 4]);
/// assert_eq!(tree.altitudes(), &[0.0, 0.0, 0.0, 1.0, 2.0]);
/// assert_eq!(tree.merge_edges()[0].edge(), 1);
/// # Ok::<(), dendra_core::HierarchyError>(())
/// ```
#[instrument(
    name = "core.bpt_canonical",
    err,
    skip(graph, edge_weights),
    fields(vertices = graph.vertex_count(), edges = graph.edge_count()),
)]
pub fn bpt_canonical<G: EdgeGraph>(
    graph: &G,
    edge_weights: &[f64],
) -> Result<BinaryPartitionTree, HierarchyError> {
    let vertex_count = graph.vertex_count();
    if vertex_count == 0 {
        return Err(HierarchyError::EmptyGraph);
    }
    validate_edge_weights(graph, edge_weights)?;

    let mut sorted: Vec<usize> = graph.edges().map(|(index, _)| index).collect();
    sorted.sort_unstable_by(|&left, &right| {
        edge_weights[left]
            .total_cmp(&edge_weights[right])
            .then(left.cmp(&right))
    });

    let node_count = 2 * vertex_count - 1;
    let mut parents: Vec<usize> = (0..node_count).collect();
    let mut altitudes = vec![0.0; node_count];
    let mut merge_edges = Vec::with_capacity(vertex_count - 1);
    let mut sets = DisjointSet::new(vertex_count);
    let mut component_node: Vec<usize> = (0..vertex_count).collect();

    for index in sorted {
        if merge_edges.len() + 1 == vertex_count {
            break;
        }
        let Some(edge) = graph.edge(index) else {
            continue;
        };
        let left = sets.find(edge.source());
        let right = sets.find(edge.target());
        if left == right {
            continue;
        }
        let node = vertex_count + merge_edges.len();
        parents[component_node[left]] = node;
        parents[component_node[right]] = node;
        altitudes[node] = edge_weights[index];
        merge_edges.push(MergeEdge::new(index, edge.source(), edge.target()));
        let root = sets.union_roots(left, right);
        component_node[root] = node;
    }

    if merge_edges.len() + 1 != vertex_count {
        let components = sets.component_count();
        warn!(components, "graph is disconnected");
        return Err(HierarchyError::DisconnectedGraph { components });
    }

    BinaryPartitionTree::assemble(parents, altitudes, merge_edges)
}
