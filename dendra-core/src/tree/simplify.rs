use super::Tree;

/// Result of [`simplify_tree`]: the reduced tree and, for each of its nodes,
/// the index of the node it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimplifiedTree {
    tree: Tree,
    node_map: Vec<usize>,
}

impl SimplifiedTree {
    /// The reduced tree.
    #[must_use]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// `node_map()[new]` is the original index of node `new`.
    #[must_use]
    pub fn node_map(&self) -> &[usize] {
        &self.node_map
    }

    /// Consumes the result, keeping the tree.
    #[must_use]
    pub fn into_tree(self) -> Tree {
        self.tree
    }
}

/// Removes the internal non-root nodes for which `remove` returns `true`.
///
/// Children of a removed node are attached to its nearest kept ancestor.
/// Leaves and the root are always kept and the relative order of kept nodes is
/// preserved, so the result is again a valid [`Tree`].
pub fn simplify_tree<F>(tree: &Tree, mut remove: F) -> SimplifiedTree
where
    F: FnMut(usize) -> bool,
{
    let node_count = tree.node_count();
    let root = tree.root();
    let keep: Vec<bool> = (0..node_count)
        .map(|node| tree.is_leaf(node) || node == root || !remove(node))
        .collect();

    // Nearest kept ancestor, resolved top-down so each lookup is O(1).
    let mut anchor = vec![root; node_count];
    for node in (tree.num_leaves()..root).rev() {
        let parent = tree.parent(node);
        anchor[node] = if keep[parent] { parent } else { anchor[parent] };
    }

    let mut new_index = vec![usize::MAX; node_count];
    let mut node_map = Vec::with_capacity(node_count);
    for node in (0..node_count).filter(|&node| keep[node]) {
        new_index[node] = node_map.len();
        node_map.push(node);
    }

    let parents = node_map
        .iter()
        .map(|&node| {
            if node == root {
                new_index[root]
            } else {
                let parent = tree.parent(node);
                let kept = if keep[parent] { parent } else { anchor[parent] };
                new_index[kept]
            }
        })
        .collect();

    SimplifiedTree {
        tree: Tree::assemble(parents, tree.num_leaves()),
        node_map,
    }
}
