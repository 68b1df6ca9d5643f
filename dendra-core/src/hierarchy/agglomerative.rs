//! Greedy agglomeration driven by a pluggable linkage.
//!
//! The lightest active edge is merged first. Edges touching the merged regions
//! are retired and replaced by one edge per distinct neighbour, weighed by the
//! linkage. Retired edges stay in the heap and are skipped when popped.

use std::{cmp::Ordering, cmp::Reverse, collections::BinaryHeap};

use tracing::{debug, instrument, warn};

use crate::graph::{EdgeGraph, validate_edge_weights};

use super::{
    BinaryPartitionTree, HierarchyError, MergeEdge,
    linkage::{Linkage, MergeNeighbour, RegionMerge},
};

#[derive(Clone, Copy, Debug)]
struct QueuedEdge {
    weight: f64,
    edge: usize,
}

impl PartialEq for QueuedEdge {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedEdge {}

impl PartialOrd for QueuedEdge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedEdge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then_with(|| self.edge.cmp(&other.edge))
    }
}

#[derive(Clone, Copy, Debug)]
struct WorkingEdge {
    source: usize,
    target: usize,
    origin: MergeEdge,
    active: bool,
}

impl WorkingEdge {
    fn opposite(&self, region: usize) -> usize {
        if self.source == region {
            self.target
        } else {
            self.source
        }
    }
}

/// Builds a binary partition tree by repeatedly merging the two regions joined
/// by the lightest edge.
///
/// After each merge every edge from the merged pair to a common neighbour,
/// parallel edges included, is replaced by a single edge whose weight
/// `linkage` computes from all of them. Edge weight ties go to the edge
/// created first. Parallel edges between two unmerged regions stay separate
/// candidates, so the lightest of them triggers their merge.
///
/// # Errors
/// Returns [`HierarchyError::EmptyGraph`] for a graph without vertices,
/// [`HierarchyError::DisconnectedGraph`] when the graph is not connected,
/// [`HierarchyError::NonMonotonicLinkage`] when the linkage weighs a new edge
/// below the current merge altitude or as NaN, and [`HierarchyError::Graph`]
/// when the weights are rejected.
///
/// # Examples
/// ```
/// use dendra_core::{SingleLinkage, UndirectedGraph, binary_partition_tree};
///
/// let graph = UndirectedGraph::with_edges(3, [(0, 1), (1, 2), (0, 2)])?;
/// let weights = [2.0, 1.0, 3.0];
/// let tree = binary_partition_tree(&graph, &weights, &mut SingleLinkage::new(&weights))?;
/// assert_eq!(tree.tree().parents(), &[4, 3, 3, 4, 4]);
/// assert_eq!(tree.altitudes()[4], 2.0);
/// # Ok::<(), dendra_core::HierarchyError>(())
/// ```
#[instrument(
    name = "core.binary_partition_tree",
    err,
    skip(graph, edge_weights, linkage),
    fields(vertices = graph.vertex_count(), edges = graph.edge_count()),
)]
pub fn binary_partition_tree<G, L>(
    graph: &G,
    edge_weights: &[f64],
    linkage: &mut L,
) -> Result<BinaryPartitionTree, HierarchyError>
where
    G: EdgeGraph,
    L: Linkage + ?Sized,
{
    let vertex_count = graph.vertex_count();
    if vertex_count == 0 {
        return Err(HierarchyError::EmptyGraph);
    }
    validate_edge_weights(graph, edge_weights)?;

    let node_count = 2 * vertex_count - 1;
    let mut edges: Vec<WorkingEdge> = (0..graph.edge_count())
        .map(|index| match graph.edge(index) {
            Some(edge) => WorkingEdge {
                source: edge.source(),
                target: edge.target(),
                origin: MergeEdge::new(index, edge.source(), edge.target()),
                active: edge.source() != edge.target(),
            },
            None => WorkingEdge {
                source: 0,
                target: 0,
                origin: MergeEdge::new(index, 0, 0),
                active: false,
            },
        })
        .collect();
    let mut incidence: Vec<Vec<usize>> = (0..vertex_count)
        .map(|vertex| graph.incident_edges(vertex).to_vec())
        .collect();
    incidence.resize_with(node_count, Vec::new);
    let mut heap: BinaryHeap<Reverse<QueuedEdge>> = edges
        .iter()
        .enumerate()
        .filter(|(_, edge)| edge.active)
        .map(|(index, _)| {
            Reverse(QueuedEdge {
                weight: edge_weights[index],
                edge: index,
            })
        })
        .collect();

    let mut parents: Vec<usize> = (0..node_count).collect();
    let mut altitudes = vec![0.0; node_count];
    let mut merge_edges = Vec::with_capacity(vertex_count - 1);
    let mut slot: Vec<Option<usize>> = vec![None; node_count];
    let mut neighbours: Vec<MergeNeighbour> = Vec::new();
    let mut origins: Vec<MergeEdge> = Vec::new();
    let mut stale = 0_usize;

    while merge_edges.len() + 1 < vertex_count {
        let Some(Reverse(queued)) = heap.pop() else {
            break;
        };
        let popped = edges[queued.edge];
        if !popped.active {
            stale += 1;
            continue;
        }
        edges[queued.edge].active = false;

        let (first, second) = (popped.source, popped.target);
        let merged = vertex_count + merge_edges.len();
        let altitude = queued.weight;
        parents[first] = merged;
        parents[second] = merged;
        altitudes[merged] = altitude;
        merge_edges.push(popped.origin);

        neighbours.clear();
        origins.clear();
        for (from_first, region) in [(true, first), (false, second)] {
            for &index in &incidence[region] {
                let edge = &mut edges[index];
                if !edge.active {
                    continue;
                }
                edge.active = false;
                let neighbour = edge.opposite(region);
                if neighbour == first || neighbour == second {
                    continue;
                }
                let entry = *slot[neighbour].get_or_insert_with(|| {
                    neighbours.push(MergeNeighbour {
                        neighbour,
                        first_edges: Vec::new(),
                        second_edges: Vec::new(),
                        new_edge: 0,
                        weight: f64::NAN,
                    });
                    origins.push(edge.origin);
                    neighbours.len() - 1
                });
                let side = if from_first {
                    &mut neighbours[entry].first_edges
                } else {
                    &mut neighbours[entry].second_edges
                };
                side.push(index);
            }
        }
        incidence[first] = Vec::new();
        incidence[second] = Vec::new();

        for (neighbour, &origin) in neighbours.iter_mut().zip(&origins) {
            slot[neighbour.neighbour] = None;
            neighbour.new_edge = edges.len();
            incidence[merged].push(neighbour.new_edge);
            incidence[neighbour.neighbour].push(neighbour.new_edge);
            edges.push(WorkingEdge {
                source: merged,
                target: neighbour.neighbour,
                origin,
                active: true,
            });
        }

        let merge = RegionMerge {
            first,
            second,
            merged,
            altitude,
        };
        linkage.merge(&merge, &mut neighbours);
        for neighbour in &neighbours {
            let weight = neighbour.weight;
            if weight.is_nan() || weight < altitude {
                return Err(HierarchyError::NonMonotonicLinkage {
                    edge: neighbour.new_edge,
                    weight,
                    altitude,
                });
            }
            heap.push(Reverse(QueuedEdge {
                weight,
                edge: neighbour.new_edge,
            }));
        }
    }

    let merges = merge_edges.len();
    if merges + 1 != vertex_count {
        let components = vertex_count - merges;
        warn!(components, "graph is disconnected");
        return Err(HierarchyError::DisconnectedGraph { components });
    }

    debug!(merges, stale, "agglomeration complete");
    #[cfg(feature = "metrics")]
    {
        metrics::counter!("hierarchy_merges_total").increment(merges as u64);
        metrics::counter!("hierarchy_stale_entries_total").increment(stale as u64);
    }

    BinaryPartitionTree::assemble(parents, altitudes, merge_edges)
}
