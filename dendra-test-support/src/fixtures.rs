//! Edge lists for small test graphs.

/// Edges `(i, i + 1)` of a path over `vertices` vertices.
///
/// # Examples
/// ```
/// use dendra_test_support::fixtures::line_edges;
///
/// assert_eq!(line_edges(3), vec![(0, 1), (1, 2)]);
/// assert!(line_edges(0).is_empty());
/// ```
#[must_use]
pub fn line_edges(vertices: usize) -> Vec<(usize, usize)> {
    (1..vertices).map(|vertex| (vertex - 1, vertex)).collect()
}
