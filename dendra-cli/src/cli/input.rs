//! Readers turning text inputs into edge-weighted graphs.
//!
//! Two layouts are understood. Edge lists hold one `source target weight`
//! triple per line. Grid files hold one weight per 4-adjacency edge of a
//! `rows x cols` image, in the order given by
//! [`dendra_core::four_adjacency_edges`]. Blank lines and lines starting with
//! `#` are skipped in both.

use std::io::BufRead;

use dendra_core::{GraphError, UndirectedGraph, four_adjacency_edge_count};
use thiserror::Error;

/// Errors raised while parsing a graph input.
#[derive(Debug, Error)]
pub enum InputError {
    /// Reading the input failed.
    #[error("failed to read line {line}: {source}")]
    Read {
        /// One-based line number.
        line: usize,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A line did not have the expected fields.
    #[error("line {line}: expected {expected}, found `{content}`")]
    Malformed {
        /// One-based line number.
        line: usize,
        /// Description of the expected layout.
        expected: &'static str,
        /// The offending line, trimmed.
        content: String,
    },
    /// An edge referenced a vertex beyond the declared count.
    #[error("line {line}: {source}")]
    Edge {
        /// One-based line number.
        line: usize,
        /// Error reported by the graph.
        #[source]
        source: GraphError,
    },
    /// A grid file held the wrong number of weights.
    #[error("a {rows}x{cols} grid has {expected} edges but {got} weights were given")]
    GridSize {
        /// Grid rows.
        rows: usize,
        /// Grid columns.
        cols: usize,
        /// Number of 4-adjacency edges.
        expected: usize,
        /// Number of weights read.
        got: usize,
    },
    /// The grid has more edges than can be addressed.
    #[error("a {rows}x{cols} grid is too large")]
    GridTooLarge {
        /// Grid rows.
        rows: usize,
        /// Grid columns.
        cols: usize,
    },
}

/// A parsed graph and its edge weights.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphInput {
    /// The graph.
    pub graph: UndirectedGraph,
    /// One weight per edge.
    pub weights: Vec<f64>,
}

/// Parses an edge list.
///
/// The vertex count is `vertices` when given, otherwise one more than the
/// largest vertex id mentioned. Without a declared count, a vertex id may
/// exceed the number of edge endpoints by at most [`MAX_IMPLIED_GAP`].
///
/// # Errors
/// Returns [`InputError::Malformed`] for lines that are not a
/// `source target weight` triple or that name a vertex id too large to imply
/// a vertex count, and [`InputError::Edge`] when an edge names a vertex
/// outside the declared count.
///
/// # Examples
/// ```
/// use dendra_cli::cli::parse_edge_list;
/// use dendra_core::EdgeGraph;
///
/// let input = parse_edge_list("# path\n0 1 0.5\n1 2 2\n".as_bytes(), None)?;
/// assert_eq!(input.graph.vertex_count(), 3);
/// assert_eq!(input.weights, vec![0.5, 2.0]);
/// # Ok::<(), dendra_cli::cli::InputError>(())
/// ```
pub fn parse_edge_list<R: BufRead>(
    reader: R,
    vertices: Option<usize>,
) -> Result<GraphInput, InputError> {
    let mut triples = Vec::new();
    for entry in data_lines(reader) {
        let (line, content) = entry?;
        let triple = parse_triple(&content).ok_or_else(|| InputError::Malformed {
            line,
            expected: "`source target weight`",
            content: content.clone(),
        })?;
        triples.push((line, triple));
    }

    let vertex_count = match vertices {
        Some(declared) => declared,
        None => implied_vertex_count(&triples)?,
    };
    let mut graph = UndirectedGraph::new(vertex_count);
    let mut weights = Vec::with_capacity(triples.len());
    for (line, (from, to, weight)) in triples {
        graph
            .add_edge(from, to)
            .map_err(|source| InputError::Edge { line, source })?;
        weights.push(weight);
    }
    Ok(GraphInput { graph, weights })
}

/// Parses the edge weights of a `rows x cols` 4-adjacency grid.
///
/// # Errors
/// Returns [`InputError::Malformed`] for lines that are not a single number
/// and [`InputError::GridSize`] when the number of weights does not match the
/// grid.
pub fn parse_grid_weights<R: BufRead>(
    reader: R,
    rows: usize,
    cols: usize,
) -> Result<GraphInput, InputError> {
    let mut weights = Vec::new();
    for entry in data_lines(reader) {
        let (line, content) = entry?;
        let weight = content
            .parse::<f64>()
            .map_err(|_| InputError::Malformed {
                line,
                expected: "a single edge weight",
                content: content.clone(),
            })?;
        weights.push(weight);
    }

    let expected =
        four_adjacency_edge_count(rows, cols).ok_or(InputError::GridTooLarge { rows, cols })?;
    if weights.len() != expected {
        return Err(InputError::GridSize {
            rows,
            cols,
            expected,
            got: weights.len(),
        });
    }
    let graph = UndirectedGraph::four_adjacency(rows, cols);
    Ok(GraphInput { graph, weights })
}

/// Largest distance between an implied vertex count and the number of edge
/// endpoints in an edge list without a declared vertex count.
pub const MAX_IMPLIED_GAP: usize = 1 << 20;

// One more than the largest id mentioned, rejecting ids that would overflow
// or allocate far more vertices than the edges touch.
fn implied_vertex_count(
    triples: &[(usize, (usize, usize, f64))],
) -> Result<usize, InputError> {
    let limit = triples
        .len()
        .saturating_mul(2)
        .saturating_add(MAX_IMPLIED_GAP);
    let mut count = 0;
    for &(line, (from, to, _)) in triples {
        let needed = from
            .max(to)
            .checked_add(1)
            .filter(|&needed| needed <= limit)
            .ok_or_else(|| InputError::Malformed {
                line,
                expected: "vertex ids below the implied vertex limit; pass --vertices",
                content: format!("{from} {to}"),
            })?;
        count = count.max(needed);
    }
    Ok(count)
}

// Numbered, trimmed lines with blanks and comments removed.
fn data_lines<R: BufRead>(reader: R) -> impl Iterator<Item = Result<(usize, String), InputError>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(index, read)| {
            let line = index + 1;
            match read {
                Err(source) => Some(Err(InputError::Read { line, source })),
                Ok(raw) => {
                    let content = raw.trim();
                    if content.is_empty() || content.starts_with('#') {
                        None
                    } else {
                        Some(Ok((line, content.to_owned())))
                    }
                }
            }
        })
}

fn parse_triple(content: &str) -> Option<(usize, usize, f64)> {
    let mut fields = content.split_whitespace();
    let source = fields.next()?.parse().ok()?;
    let target = fields.next()?.parse().ok()?;
    let weight = fields.next()?.parse().ok()?;
    fields.next().is_none().then_some((source, target, weight))
}
