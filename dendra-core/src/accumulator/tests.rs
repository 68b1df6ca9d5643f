//! Tests for grouped and tree accumulation.

use proptest::prelude::*;
use rstest::rstest;

use super::*;
use crate::{error::AccumulateErrorCode, test_utils::suite_proptest_config};

const GROUPS: [Option<usize>; 6] = [Some(0), Some(1), Some(0), None, Some(1), Some(0)];
const VALUES: [f64; 6] = [3.0, -1.0, 1.0, 50.0, 4.0, 1.0];

#[test]
fn sum_and_mean_skip_dropped_elements() {
    let sums = accumulate(&GROUPS, 3, &VALUES, &Sum).expect("valid grouping");
    let means = accumulate(&GROUPS, 3, &VALUES, &Mean).expect("valid grouping");
    let counts = accumulate(&GROUPS, 3, &VALUES, &Counter).expect("valid grouping");
    assert_eq!(sums, vec![5.0, 3.0, 0.0]);
    assert_eq!(counts, vec![3.0, 2.0, 0.0]);
    assert_eq!(means, vec![5.0 / 3.0, 1.5, 0.0]);
}

#[test]
fn extrema_report_identities_for_empty_groups() {
    let minima = accumulate(&GROUPS, 3, &VALUES, &Min).expect("valid grouping");
    let maxima = accumulate(&GROUPS, 3, &VALUES, &Max).expect("valid grouping");
    assert_eq!(minima, vec![1.0, -1.0, f64::INFINITY]);
    assert_eq!(maxima, vec![3.0, 4.0, f64::NEG_INFINITY]);
}

#[test]
fn arg_extrema_keep_first_index_on_ties() {
    let arg_min = accumulate(&GROUPS, 3, &VALUES, &ArgMin).expect("valid grouping");
    let arg_max = accumulate(&GROUPS, 3, &VALUES, &ArgMax).expect("valid grouping");
    assert_eq!(arg_min, vec![Some(2), Some(1), None]);
    assert_eq!(arg_max, vec![Some(0), Some(4), None]);
}

#[rstest]
#[case::length(vec![Some(0)], 1, vec![1.0, 2.0], AccumulateErrorCode::LengthMismatch)]
#[case::group(vec![Some(0), Some(2)], 2, vec![1.0, 2.0], AccumulateErrorCode::GroupOutOfRange)]
fn accumulate_rejects_bad_groupings(
    #[case] groups: Vec<Option<usize>>,
    #[case] group_count: usize,
    #[case] values: Vec<f64>,
    #[case] code: AccumulateErrorCode,
) {
    let err = accumulate(&groups, group_count, &values, &Sum).expect_err("grouping is invalid");
    assert_eq!(err.code(), code);
}

#[test]
fn accumulate_children_reduces_direct_children_only() {
    let tree = Tree::from_parents(vec![3, 3, 4, 4, 4]).expect("valid parents");
    let values = [1.0, 2.0, 4.0, 10.0, 100.0];
    let sums = accumulate_children(&tree, &values, &Sum).expect("one value per node");
    assert_eq!(sums, vec![0.0, 0.0, 0.0, 3.0, 14.0]);
}

#[test]
fn accumulate_sequential_propagates_to_root() {
    let tree = Tree::from_parents(vec![3, 3, 4, 4, 4]).expect("valid parents");
    let maxima = accumulate_sequential(&tree, &[1.0, 7.0, 4.0], &Max).expect("one value per leaf");
    assert_eq!(maxima, vec![1.0, 7.0, 4.0, 7.0, 7.0]);

    let err = accumulate_sequential(&tree, &[1.0], &Sum).expect_err("too few leaf values");
    assert_eq!(
        err,
        AccumulateError::LengthMismatch {
            expected: 3,
            got: 1
        }
    );
}

proptest! {
    #![proptest_config(suite_proptest_config(256))]

    #[test]
    fn mean_equals_sum_over_count(
        entries in proptest::collection::vec((0_usize..5, -1.0e6_f64..1.0e6), 0..64),
    ) {
        let groups: Vec<Option<usize>> = entries.iter().map(|&(group, _)| Some(group)).collect();
        let values: Vec<f64> = entries.iter().map(|&(_, value)| value).collect();
        let sums = accumulate(&groups, 5, &values, &Sum).expect("valid grouping");
        let counts = accumulate(&groups, 5, &values, &Counter).expect("valid grouping");
        let means = accumulate(&groups, 5, &values, &Mean).expect("valid grouping");
        for group in 0..5 {
            if counts[group] > 0.0 {
                prop_assert_eq!(means[group], sums[group] / counts[group]);
            }
        }
        prop_assert_eq!(counts.iter().sum::<f64>(), entries.len() as f64);
    }
}
