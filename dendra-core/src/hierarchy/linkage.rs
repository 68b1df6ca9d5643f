//! Linkage rules weighing the edges of a freshly merged region.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::graph::check_length;

use super::HierarchyError;

/// The merge being performed: regions `first` and `second` become `merged`
/// at `altitude`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionMerge {
    pub(super) first: usize,
    pub(super) second: usize,
    pub(super) merged: usize,
    pub(super) altitude: f64,
}

impl RegionMerge {
    /// First merged region.
    #[must_use]
    pub const fn first(&self) -> usize {
        self.first
    }

    /// Second merged region.
    #[must_use]
    pub const fn second(&self) -> usize {
        self.second
    }

    /// The region created by the merge.
    #[must_use]
    pub const fn merged(&self) -> usize {
        self.merged
    }

    /// Weight of the edge that triggered the merge.
    #[must_use]
    pub const fn altitude(&self) -> f64 {
        self.altitude
    }
}

/// A region adjacent to a merge and the edges joining it to the merged pair.
///
/// Parallel edges are all listed, in incidence order, so a linkage sees every
/// edge the new edge replaces.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeNeighbour {
    pub(super) neighbour: usize,
    pub(super) first_edges: Vec<usize>,
    pub(super) second_edges: Vec<usize>,
    pub(super) new_edge: usize,
    pub(super) weight: f64,
}

impl MergeNeighbour {
    /// The adjacent region.
    #[must_use]
    pub const fn neighbour(&self) -> usize {
        self.neighbour
    }

    /// First edge from the first merged region, if any.
    #[must_use]
    pub fn first_edge(&self) -> Option<usize> {
        self.first_edges.first().copied()
    }

    /// First edge from the second merged region, if any.
    #[must_use]
    pub fn second_edge(&self) -> Option<usize> {
        self.second_edges.first().copied()
    }

    /// Every edge from the first merged region.
    #[must_use]
    pub fn first_edges(&self) -> &[usize] {
        &self.first_edges
    }

    /// Every edge from the second merged region.
    #[must_use]
    pub fn second_edges(&self) -> &[usize] {
        &self.second_edges
    }

    /// Index of the edge joining the neighbour to the merged region.
    #[must_use]
    pub const fn new_edge(&self) -> usize {
        self.new_edge
    }

    /// Weight assigned so far.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }

    /// Assigns the weight of the new edge.
    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    /// Every edge replaced by [`MergeNeighbour::new_edge`], first side first.
    pub fn old_edges(&self) -> impl Iterator<Item = usize> + '_ {
        self.first_edges.iter().chain(&self.second_edges).copied()
    }
}

/// Computes the weights of the edges created by a merge.
///
/// Implementations must fill every neighbour's weight and keep any per-edge
/// statistics they need, extending them for [`MergeNeighbour::new_edge`].
/// Weights below [`RegionMerge::altitude`] are rejected by the builder.
pub trait Linkage {
    /// Weighs the new edge of every neighbour.
    fn merge(&mut self, merge: &RegionMerge, neighbours: &mut [MergeNeighbour]);
}

/// Built-in linkages selectable by configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LinkageKind {
    /// Mean weight of all fine edges on the boundary.
    #[default]
    Average,
    /// Minimum boundary edge weight.
    Single,
    /// Maximum boundary edge weight.
    Complete,
}

// Unknown edges read as NaN so the builder reports them instead of panicking.
fn load(values: &[f64], edge: usize) -> f64 {
    values.get(edge).copied().unwrap_or(f64::NAN)
}

fn store(weights: &mut Vec<f64>, edge: usize, weight: f64) {
    if weights.len() <= edge {
        weights.resize(edge + 1, f64::NAN);
    }
    weights[edge] = weight;
}

/// Weighs merged edges by the minimum of the edges they replace.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SingleLinkage {
    weights: Vec<f64>,
}

impl SingleLinkage {
    /// Starts from the input edge weights.
    #[must_use]
    pub fn new(edge_weights: &[f64]) -> Self {
        Self {
            weights: edge_weights.to_vec(),
        }
    }
}

impl Linkage for SingleLinkage {
    fn merge(&mut self, _merge: &RegionMerge, neighbours: &mut [MergeNeighbour]) {
        for neighbour in neighbours {
            let weight = neighbour
                .old_edges()
                .map(|edge| load(&self.weights, edge))
                .fold(f64::INFINITY, f64::min);
            store(&mut self.weights, neighbour.new_edge, weight);
            neighbour.set_weight(weight);
        }
    }
}

/// Weighs merged edges by the maximum of the edges they replace.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompleteLinkage {
    weights: Vec<f64>,
}

impl CompleteLinkage {
    /// Starts from the input edge weights.
    #[must_use]
    pub fn new(edge_weights: &[f64]) -> Self {
        Self {
            weights: edge_weights.to_vec(),
        }
    }
}

impl Linkage for CompleteLinkage {
    fn merge(&mut self, _merge: &RegionMerge, neighbours: &mut [MergeNeighbour]) {
        for neighbour in neighbours {
            let weight = neighbour
                .old_edges()
                .map(|edge| load(&self.weights, edge))
                .fold(f64::NEG_INFINITY, f64::max);
            store(&mut self.weights, neighbour.new_edge, weight);
            neighbour.set_weight(weight);
        }
    }
}

/// Weighs merged edges by the mean over all fine edges they gather.
///
/// Each edge carries the sum and the number of fine edges it stands for, so
/// repeated merges keep the exact mean instead of averaging averages.
///
/// A mean of edges no lighter than the merge altitude cannot fall below it,
/// but the running sums can round it a few ulps under. A mean at most
/// `4 * f64::EPSILON * max(|altitude|, 1)` below the altitude is raised to the
/// altitude. Larger drops are left alone and the builder reports them as
/// [`HierarchyError::NonMonotonicLinkage`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AverageLinkage {
    sums: Vec<f64>,
    counts: Vec<f64>,
}

impl AverageLinkage {
    /// Starts from per-edge mean weights and the number of fine edges behind
    /// each mean.
    ///
    /// # Errors
    /// Returns [`HierarchyError::Graph`] when the arrays differ in length and
    /// [`HierarchyError::InvalidEdgeCount`] when a count is not a positive
    /// finite number.
    pub fn new(mean_weights: &[f64], counts: &[f64]) -> Result<Self, HierarchyError> {
        check_length("edge counts", mean_weights.len(), counts.len())?;
        let sums = mean_weights
            .iter()
            .zip(counts)
            .map(|(mean, count)| mean * count)
            .collect();
        Self::from_sums(sums, counts)
    }

    /// Starts from per-edge weight sums and fine edge counts.
    ///
    /// # Errors
    /// See [`AverageLinkage::new`].
    pub fn from_sums(sums: Vec<f64>, counts: &[f64]) -> Result<Self, HierarchyError> {
        check_length("edge counts", sums.len(), counts.len())?;
        if let Some(edge) = counts
            .iter()
            .position(|&count| !(count.is_finite() && count > 0.0))
        {
            return Err(HierarchyError::InvalidEdgeCount {
                edge,
                count: counts[edge],
            });
        }
        Ok(Self {
            sums,
            counts: counts.to_vec(),
        })
    }
}

impl Linkage for AverageLinkage {
    fn merge(&mut self, merge: &RegionMerge, neighbours: &mut [MergeNeighbour]) {
        for neighbour in neighbours {
            let (sum, count) = neighbour
                .old_edges()
                .map(|edge| (load(&self.sums, edge), load(&self.counts, edge)))
                .fold((0.0, 0.0), |(sum, count), (s, c)| (sum + s, count + c));
            store(&mut self.sums, neighbour.new_edge, sum);
            store(&mut self.counts, neighbour.new_edge, count);
            neighbour.set_weight(snap_to_altitude(sum / count, merge.altitude));
        }
    }
}

fn snap_to_altitude(mean: f64, altitude: f64) -> f64 {
    let tolerance = 4.0 * f64::EPSILON * altitude.abs().max(1.0);
    if mean < altitude && altitude - mean <= tolerance {
        altitude
    } else {
        mean
    }
}
