//! Tests for tree validation, simplification and node attributes.

use rstest::rstest;

use super::*;
use crate::error::TreeErrorCode;

fn hierarchy(parents: Vec<usize>, altitudes: Vec<f64>) -> Hierarchy {
    let tree = Tree::from_parents(parents).expect("valid parents");
    Hierarchy::new(tree, altitudes).expect("valid altitudes")
}

#[test]
fn single_node_tree_is_leaf_and_root() {
    let tree = Tree::from_parents(vec![0]).expect("single root");
    assert_eq!(tree.num_leaves(), 1);
    assert_eq!(tree.root(), 0);
    assert!(tree.is_leaf(0));
    assert!(tree.children(0).is_empty());
    assert!(tree.internal_nodes().is_empty());
}

#[test]
fn children_are_listed_in_index_order() {
    let tree = Tree::from_parents(vec![5, 4, 4, 5, 5, 5]).expect("valid parents");
    assert_eq!(tree.num_leaves(), 4);
    assert_eq!(tree.children(4), &[1, 2]);
    assert_eq!(tree.children(5), &[0, 3, 4]);
    assert_eq!(tree.leaves(), 0..4);
    assert_eq!(tree.internal_nodes(), 4..6);
}

#[rstest]
#[case::empty(vec![], TreeErrorCode::Empty)]
#[case::missing_root(vec![1, 2, 1], TreeErrorCode::MissingRoot)]
#[case::two_roots(vec![0, 2, 2], TreeErrorCode::MultipleRoots)]
#[case::backwards(vec![3, 0, 3, 3], TreeErrorCode::ParentOrder)]
#[case::out_of_range(vec![9, 2, 2], TreeErrorCode::ParentOutOfRange)]
#[case::late_leaf(vec![2, 2, 4, 4, 4], TreeErrorCode::LeafAfterInternal)]
fn from_parents_rejects_invalid_arrays(#[case] parents: Vec<usize>, #[case] code: TreeErrorCode) {
    let err = Tree::from_parents(parents).expect_err("parents are invalid");
    assert_eq!(err.code(), code);
}

#[rstest]
#[case::short(vec![0.0, 0.0], TreeErrorCode::AltitudeLengthMismatch)]
#[case::nan(vec![0.0, 0.0, f64::NAN], TreeErrorCode::NanAltitude)]
#[case::inverted(vec![2.0, 0.0, 1.0], TreeErrorCode::NonMonotonicAltitude)]
fn hierarchy_rejects_invalid_altitudes(#[case] altitudes: Vec<f64>, #[case] code: TreeErrorCode) {
    let tree = Tree::from_parents(vec![2, 2, 2]).expect("valid parents");
    let err = Hierarchy::new(tree, altitudes).expect_err("altitudes are invalid");
    assert_eq!(err.code(), code);
}

#[test]
fn simplify_reattaches_children_to_kept_ancestor() {
    let tree = Tree::from_parents(vec![4, 4, 5, 6, 5, 6, 6]).expect("valid parents");
    let simplified = simplify_tree(&tree, |node| node == 5);
    assert_eq!(simplified.tree().parents(), &[4, 4, 5, 5, 5, 5]);
    assert_eq!(simplified.node_map(), &[0, 1, 2, 3, 4, 6]);
}

#[test]
fn simplify_never_removes_leaves_or_root() {
    let tree = Tree::from_parents(vec![2, 2, 2]).expect("valid parents");
    let simplified = simplify_tree(&tree, |_| true);
    assert_eq!(simplified.tree(), &tree);
    assert_eq!(simplified.node_map(), &[0, 1, 2]);
}

#[test]
fn canonize_merges_equal_altitude_chains() {
    let hierarchy = hierarchy(
        vec![4, 4, 5, 6, 5, 6, 6],
        vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 2.0],
    );
    let canonical = hierarchy.canonize();
    assert_eq!(canonical.tree().parents(), &[4, 4, 4, 5, 5, 5]);
    assert_eq!(canonical.altitudes(), &[0.0, 0.0, 0.0, 0.0, 1.0, 2.0]);
}

#[test]
fn area_counts_leaves() {
    let tree = Tree::from_parents(vec![4, 4, 5, 6, 5, 6, 6]).expect("valid parents");
    assert_eq!(
        attribute_area(&tree),
        vec![1.0, 1.0, 1.0, 1.0, 2.0, 3.0, 4.0]
    );
}

#[test]
fn volume_sums_gap_times_area() {
    let hierarchy = hierarchy(vec![3, 3, 4, 4, 4], vec![0.0, 0.0, 0.0, 1.0, 3.0]);
    let area = attribute_area(hierarchy.tree());
    assert_eq!(attribute_volume(&hierarchy, &area), vec![0.0, 0.0, 0.0, 4.0, 4.0]);
}

#[test]
fn minima_depth_and_dynamics_follow_the_deepest_basin() {
    // Two basins at altitudes 1 and 2 joined at 5.
    let hierarchy = hierarchy(
        vec![4, 4, 5, 5, 6, 6, 6],
        vec![0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 5.0],
    );
    let minima = attribute_minima(&hierarchy);
    assert_eq!(minima, vec![false, false, false, false, true, true, false]);

    let depth = attribute_depth(&hierarchy, &minima);
    assert_eq!(depth[4], 1.0);
    assert_eq!(depth[5], 2.0);
    assert_eq!(depth[6], 1.0);
    assert!(depth[0].is_infinite());

    let dynamics = attribute_dynamics(&hierarchy, &depth);
    assert_eq!(dynamics[6], 4.0);
    assert_eq!(dynamics[4], 4.0, "deepest child inherits the root dynamics");
    assert_eq!(dynamics[5], 3.0);
}

#[test]
fn plateau_above_minimum_is_not_a_minimum() {
    let hierarchy = hierarchy(vec![3, 3, 4, 4, 4], vec![0.0, 0.0, 0.0, 1.0, 1.0]);
    let minima = attribute_minima(&hierarchy);
    assert_eq!(minima, vec![false, false, false, false, true]);
}

#[test]
fn single_leaf_hierarchy_has_no_minima() {
    let hierarchy = hierarchy(vec![0], vec![0.0]);
    let minima = attribute_minima(&hierarchy);
    let depth = attribute_depth(&hierarchy, &minima);
    assert_eq!(attribute_dynamics(&hierarchy, &depth), vec![0.0]);
}

#[cfg(feature = "serde")]
mod serde_round_trip {
    use super::*;

    #[test]
    fn deserialising_revalidates_parents() {
        let err = serde_json::from_str::<Tree>("[0, 2, 2]").expect_err("two roots");
        assert!(err.to_string().contains("second root"));
    }

    #[test]
    fn hierarchy_survives_json() {
        let original = hierarchy(vec![2, 2, 2], vec![0.0, 0.0, 1.5]);
        let json = serde_json::to_string(&original).expect("serialise");
        let decoded: Hierarchy = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(decoded, original);
    }
}
