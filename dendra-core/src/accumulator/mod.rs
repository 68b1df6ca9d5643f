//! Grouped reductions of fine values onto coarse elements.
//!
//! A grouping maps each fine element (a vertex, an edge, a tree child) to a
//! coarse element or drops it. Reducers are small streaming folds so every
//! group needs only constant state.

use crate::{error::AccumulateError, tree::Tree};

/// A streaming fold over the values of one group.
pub trait Reducer {
    /// Running state of one group.
    type State;
    /// Value produced for one group.
    type Output;

    /// State of a group that has seen no values.
    fn start(&self) -> Self::State;

    /// Folds the value of fine element `index` into `state`.
    fn push(&self, state: &mut Self::State, index: usize, value: f64);

    /// Produces the group's output.
    fn finish(&self, state: Self::State) -> Self::Output;
}

/// Sum of the values; `0` for empty groups.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sum;

/// Arithmetic mean; `0` for empty groups.
///
/// The running sum is folded exactly as [`Sum`] folds it, so
/// `mean == sum / count` holds bit-for-bit.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mean;

/// Smallest value; `+inf` for empty groups.
#[derive(Clone, Copy, Debug, Default)]
pub struct Min;

/// Largest value; `-inf` for empty groups.
#[derive(Clone, Copy, Debug, Default)]
pub struct Max;

/// Number of values; `0` for empty groups.
#[derive(Clone, Copy, Debug, Default)]
pub struct Counter;

/// Index of the smallest value, the first one on ties.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArgMin;

/// Index of the largest value, the first one on ties.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArgMax;

impl Reducer for Sum {
    type State = f64;
    type Output = f64;

    fn start(&self) -> f64 {
        0.0
    }

    fn push(&self, state: &mut f64, _index: usize, value: f64) {
        *state += value;
    }

    fn finish(&self, state: f64) -> f64 {
        state
    }
}

impl Reducer for Mean {
    type State = (f64, usize);
    type Output = f64;

    fn start(&self) -> Self::State {
        (Sum.start(), 0)
    }

    fn push(&self, (sum, count): &mut Self::State, index: usize, value: f64) {
        Sum.push(sum, index, value);
        *count += 1;
    }

    #[expect(clippy::cast_precision_loss, reason = "group sizes fit in f64 mantissa")]
    fn finish(&self, (sum, count): Self::State) -> f64 {
        if count == 0 { 0.0 } else { sum / count as f64 }
    }
}

impl Reducer for Min {
    type State = f64;
    type Output = f64;

    fn start(&self) -> f64 {
        f64::INFINITY
    }

    fn push(&self, state: &mut f64, _index: usize, value: f64) {
        if value < *state {
            *state = value;
        }
    }

    fn finish(&self, state: f64) -> f64 {
        state
    }
}

impl Reducer for Max {
    type State = f64;
    type Output = f64;

    fn start(&self) -> f64 {
        f64::NEG_INFINITY
    }

    fn push(&self, state: &mut f64, _index: usize, value: f64) {
        if value > *state {
            *state = value;
        }
    }

    fn finish(&self, state: f64) -> f64 {
        state
    }
}

impl Reducer for Counter {
    type State = usize;
    type Output = f64;

    fn start(&self) -> usize {
        0
    }

    fn push(&self, state: &mut usize, _index: usize, _value: f64) {
        *state += 1;
    }

    #[expect(clippy::cast_precision_loss, reason = "group sizes fit in f64 mantissa")]
    fn finish(&self, state: usize) -> f64 {
        state as f64
    }
}

impl Reducer for ArgMin {
    type State = Option<(usize, f64)>;
    type Output = Option<usize>;

    fn start(&self) -> Self::State {
        None
    }

    fn push(&self, state: &mut Self::State, index: usize, value: f64) {
        match state {
            Some((_, best)) if value >= *best || value.is_nan() => {}
            _ => *state = Some((index, value)),
        }
    }

    fn finish(&self, state: Self::State) -> Option<usize> {
        state.map(|(index, _)| index)
    }
}

impl Reducer for ArgMax {
    type State = Option<(usize, f64)>;
    type Output = Option<usize>;

    fn start(&self) -> Self::State {
        None
    }

    fn push(&self, state: &mut Self::State, index: usize, value: f64) {
        match state {
            Some((_, best)) if value <= *best || value.is_nan() => {}
            _ => *state = Some((index, value)),
        }
    }

    fn finish(&self, state: Self::State) -> Option<usize> {
        state.map(|(index, _)| index)
    }
}

/// Reduces `values` into `group_count` groups.
///
/// `groups[i]` names the group receiving `values[i]`, or `None` to drop it.
///
/// # Errors
/// Returns [`AccumulateError::LengthMismatch`] when `groups` and `values`
/// differ in length and [`AccumulateError::GroupOutOfRange`] when a group id
/// is not below `group_count`. Nothing is folded when an error is returned.
///
/// # Examples
/// ```
/// use dendra_core::{Mean, accumulate};
///
/// let groups = [Some(0), Some(1), Some(0), None];
/// let means = accumulate(&groups, 2, &[1.0, 5.0, 3.0, 100.0], &Mean)?;
/// assert_eq!(means, vec![2.0, 5.0]);
/// # Ok::<(), dendra_core::AccumulateError>(())
/// ```
pub fn accumulate<R: Reducer>(
    groups: &[Option<usize>],
    group_count: usize,
    values: &[f64],
    reducer: &R,
) -> Result<Vec<R::Output>, AccumulateError> {
    if groups.len() != values.len() {
        return Err(AccumulateError::LengthMismatch {
            expected: groups.len(),
            got: values.len(),
        });
    }
    if let Some((index, group)) = groups
        .iter()
        .enumerate()
        .find_map(|(index, group)| group.filter(|&g| g >= group_count).map(|g| (index, g)))
    {
        return Err(AccumulateError::GroupOutOfRange {
            index,
            group,
            group_count,
        });
    }

    let mut states: Vec<R::State> = (0..group_count).map(|_| reducer.start()).collect();
    for (index, (group, &value)) in groups.iter().zip(values).enumerate() {
        if let Some(group) = *group {
            reducer.push(&mut states[group], index, value);
        }
    }
    Ok(states.into_iter().map(|state| reducer.finish(state)).collect())
}

/// Reduces, for every node of `tree`, the values of its children.
///
/// Leaves receive the reducer's empty output.
///
/// # Errors
/// Returns [`AccumulateError::LengthMismatch`] unless `node_values` has one
/// entry per node.
pub fn accumulate_children<R: Reducer>(
    tree: &Tree,
    node_values: &[f64],
    reducer: &R,
) -> Result<Vec<R::Output>, AccumulateError> {
    check_len(tree.node_count(), node_values.len())?;
    Ok((0..tree.node_count())
        .map(|node| {
            let mut state = reducer.start();
            for &child in tree.children(node) {
                reducer.push(&mut state, child, node_values[child]);
            }
            reducer.finish(state)
        })
        .collect())
}

/// Propagates `leaf_values` up to the root: each internal node receives the
/// reduction of its children's propagated values.
///
/// # Errors
/// Returns [`AccumulateError::LengthMismatch`] unless `leaf_values` has one
/// entry per leaf.
pub fn accumulate_sequential<R>(
    tree: &Tree,
    leaf_values: &[f64],
    reducer: &R,
) -> Result<Vec<f64>, AccumulateError>
where
    R: Reducer<Output = f64>,
{
    check_len(tree.num_leaves(), leaf_values.len())?;
    let mut values = leaf_values.to_vec();
    values.resize(tree.node_count(), 0.0);
    for node in tree.internal_nodes() {
        let mut state = reducer.start();
        for &child in tree.children(node) {
            reducer.push(&mut state, child, values[child]);
        }
        values[node] = reducer.finish(state);
    }
    Ok(values)
}

fn check_len(expected: usize, got: usize) -> Result<(), AccumulateError> {
    if expected == got {
        Ok(())
    } else {
        Err(AccumulateError::LengthMismatch { expected, got })
    }
}

#[cfg(test)]
mod tests;
