//! Node attributes of hierarchies used to rank basins.

use super::{Hierarchy, Tree};

/// Number of leaves below each node.
#[must_use]
pub fn attribute_area(tree: &Tree) -> Vec<f64> {
    let mut area = vec![1.0; tree.node_count()];
    for node in tree.internal_nodes() {
        area[node] = tree.children(node).iter().map(|&child| area[child]).sum();
    }
    area
}

/// Volume of each node: its area times the altitude gap to its parent, plus
/// the volumes of its children. Leaves have volume zero.
///
/// # Panics
/// Panics when `area` has fewer entries than the tree has nodes.
#[must_use]
pub fn attribute_volume(hierarchy: &Hierarchy, area: &[f64]) -> Vec<f64> {
    let tree = hierarchy.tree();
    let altitudes = hierarchy.altitudes();
    let mut volume = vec![0.0; tree.node_count()];
    for node in tree.internal_nodes() {
        let gap = (altitudes[tree.parent(node)] - altitudes[node]).abs();
        let below: f64 = tree.children(node).iter().map(|&child| volume[child]).sum();
        volume[node] = gap.mul_add(area[node], below);
    }
    volume
}

/// Regional minima: internal nodes whose subtree is a flat zone strictly below
/// the parent.
#[must_use]
pub fn attribute_minima(hierarchy: &Hierarchy) -> Vec<bool> {
    let tree = hierarchy.tree();
    let altitudes = hierarchy.altitudes();
    let mut flat = vec![false; tree.node_count()];
    let mut minima = vec![false; tree.node_count()];
    for node in tree.internal_nodes() {
        flat[node] = tree.children(node).iter().all(|&child| {
            tree.is_leaf(child) || (flat[child] && altitudes[child] == altitudes[node])
        });
        let parent = tree.parent(node);
        minima[node] = flat[node] && (parent == node || altitudes[parent] != altitudes[node]);
    }
    minima
}

/// Altitude of the lowest minimum in each subtree, `+inf` when the subtree
/// holds none.
///
/// # Panics
/// Panics when `minima` has fewer entries than the tree has nodes.
#[must_use]
pub fn attribute_depth(hierarchy: &Hierarchy, minima: &[bool]) -> Vec<f64> {
    let tree = hierarchy.tree();
    let altitudes = hierarchy.altitudes();
    let mut depth = vec![f64::INFINITY; tree.node_count()];
    for node in tree.internal_nodes() {
        if minima[node] {
            depth[node] = altitudes[node];
        } else {
            depth[node] = tree
                .children(node)
                .iter()
                .map(|&child| depth[child])
                .fold(f64::INFINITY, f64::min);
        }
    }
    depth
}

/// Dynamics of each node, computed top-down.
///
/// The child whose subtree holds the deepest minimum (ties go to the lower
/// index) inherits its parent's dynamics; every other child holding a minimum
/// gets the altitude of the parent minus its own depth. Nodes without a
/// minimum get zero.
///
/// # Panics
/// Panics when `depth` has fewer entries than the tree has nodes.
#[must_use]
pub fn attribute_dynamics(hierarchy: &Hierarchy, depth: &[f64]) -> Vec<f64> {
    let tree = hierarchy.tree();
    let altitudes = hierarchy.altitudes();
    let mut dynamics = vec![0.0; tree.node_count()];
    let root = tree.root();
    if depth[root].is_finite() {
        dynamics[root] = altitudes[root] - depth[root];
    }
    for node in tree.internal_nodes().rev() {
        let mut holders = tree
            .children(node)
            .iter()
            .copied()
            .filter(|&child| depth[child].is_finite());
        let Some(first) = holders.next() else {
            continue;
        };
        let deepest = holders.fold(first, |best, child| {
            if depth[child] < depth[best] { child } else { best }
        });
        for &child in tree.children(node) {
            if !depth[child].is_finite() {
                continue;
            }
            dynamics[child] = if child == deepest {
                dynamics[node]
            } else {
                altitudes[node] - depth[child]
            };
        }
    }
    dynamics
}
