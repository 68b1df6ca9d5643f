//! Command implementations and argument parsing for the dendra CLI.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use dendra_core::{
    Criterion, DendraError, EdgeGraph, Hierarchy, LabellingStrategy, LinkageKind, PipelineBuilder,
    bpt_canonical, watershed_hierarchy,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{Span, field, info, instrument};

use super::input::{GraphInput, InputError, parse_edge_list, parse_grid_weights};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(name = "dendra", about = "Build segmentation hierarchies of edge-weighted graphs.")]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Segment the graph into regions and build their hierarchy.
    Run(RunCommand),
    /// Build the watershed hierarchy of the graph itself.
    Watershed(WatershedCommand),
}

/// Options accepted by the `run` command.
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Linkage weighing merged region boundaries.
    #[arg(long, value_enum, default_value_t = LinkageArg::Average)]
    pub linkage: LinkageArg,

    /// Re-rank the region hierarchy by basin significance.
    #[arg(long, value_enum)]
    pub criterion: Option<CriterionArg>,

    /// Cut initial regions at this weight instead of by watershed flooding.
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Input graph.
    #[command(subcommand)]
    pub source: InputSource,
}

/// Options accepted by the `watershed` command.
#[derive(Debug, Args, Clone)]
pub struct WatershedCommand {
    /// Attribute ranking the basins.
    #[arg(long, value_enum)]
    pub criterion: CriterionArg,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Input graph.
    #[command(subcommand)]
    pub source: InputSource,
}

/// Input layouts.
#[derive(Debug, Subcommand, Clone)]
pub enum InputSource {
    /// Edge list with one `source target weight` triple per line.
    Edges(EdgesArgs),
    /// 4-adjacency grid with one edge weight per line.
    Grid(GridArgs),
}

/// Edge list arguments.
#[derive(Debug, Args, Clone)]
pub struct EdgesArgs {
    /// Path to the edge list.
    pub path: PathBuf,

    /// Vertex count; defaults to one more than the largest vertex id.
    #[arg(long)]
    pub vertices: Option<usize>,
}

/// Grid arguments.
#[derive(Debug, Args, Clone)]
pub struct GridArgs {
    /// Path to the edge weights.
    pub path: PathBuf,

    /// Number of grid rows.
    #[arg(long)]
    pub rows: usize,

    /// Number of grid columns.
    #[arg(long)]
    pub cols: usize,
}

/// Linkages selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LinkageArg {
    /// Mean boundary weight.
    Average,
    /// Lightest boundary edge.
    Single,
    /// Heaviest boundary edge.
    Complete,
}

impl From<LinkageArg> for LinkageKind {
    fn from(value: LinkageArg) -> Self {
        match value {
            LinkageArg::Average => Self::Average,
            LinkageArg::Single => Self::Single,
            LinkageArg::Complete => Self::Complete,
        }
    }
}

/// Significance criteria selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CriterionArg {
    /// Basin size.
    Area,
    /// Basin depth.
    Dynamics,
    /// Basin volume.
    Volume,
}

impl From<CriterionArg> for Criterion {
    fn from(value: CriterionArg) -> Self {
        match value {
            CriterionArg::Area => Self::Area,
            CriterionArg::Dynamics => Self::Dynamics,
            CriterionArg::Volume => Self::Volume,
        }
    }
}

/// Output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One `key: values` line per field.
    #[default]
    Text,
    /// A single JSON object.
    Json,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The input file could not be opened.
    #[error("failed to open `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The input file could not be parsed.
    #[error("failed to parse `{path}`: {source}")]
    Input {
        /// Path of the input.
        path: PathBuf,
        /// Parse failure.
        #[source]
        source: InputError,
    },
    /// Segmentation failed.
    #[error(transparent)]
    Core(#[from] DendraError),
}

/// Outcome of a CLI command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionSummary {
    /// Format requested for rendering.
    #[serde(skip)]
    pub format: OutputFormat,
    /// Vertices in the input graph.
    pub vertices: usize,
    /// Region of each input vertex; absent when the hierarchy leaves are the
    /// input vertices.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<usize>>,
    /// Parent of each hierarchy node.
    pub parents: Vec<usize>,
    /// Altitude of each hierarchy node.
    pub altitudes: Vec<f64>,
}

impl ExecutionSummary {
    fn new(
        format: OutputFormat,
        vertices: usize,
        labels: Option<Vec<usize>>,
        hierarchy: Hierarchy,
    ) -> Self {
        let (tree, altitudes) = hierarchy.into_parts();
        Self {
            format,
            vertices,
            labels,
            parents: tree.into_parents(),
            altitudes,
        }
    }
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when the input cannot be read or segmentation fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use dendra_cli::cli::{Cli, Command, EdgesArgs, InputSource, LinkageArg, OutputFormat,
/// #     RunCommand, run_cli};
/// # use tempfile::NamedTempFile;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let file = NamedTempFile::new()?;
/// std::fs::write(file.path(), "0 1 0\n1 2 5\n2 3 1\n")?;
/// let cli = Cli {
///     command: Command::Run(RunCommand {
///         linkage: LinkageArg::Average,
///         criterion: None,
///         threshold: None,
///         format: OutputFormat::Text,
///         source: InputSource::Edges(EdgesArgs {
///             path: file.path().to_path_buf(),
///             vertices: None,
///         }),
///     }),
/// };
/// let summary = run_cli(cli)?;
/// assert_eq!(summary.labels, Some(vec![0, 0, 1, 1]));
/// assert_eq!(summary.parents, vec![2, 2, 2]);
/// # Ok(())
/// # }
/// ```
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    let span = Span::current();
    match cli.command {
        Command::Run(run) => {
            span.record("command", field::display("run"));
            run_command(run)
        }
        Command::Watershed(watershed) => {
            span.record("command", field::display("watershed"));
            run_watershed(watershed)
        }
    }
}

#[instrument(
    name = "cli.execute",
    err,
    skip(command),
    fields(linkage = ?command.linkage, criterion = field::Empty, threshold = field::Empty),
)]
pub(super) fn run_command(command: RunCommand) -> Result<ExecutionSummary, CliError> {
    let span = Span::current();
    let mut builder = PipelineBuilder::new()
        .with_linkage(command.linkage.into())
        .with_criterion(command.criterion.map(Criterion::from));
    if let Some(criterion) = command.criterion {
        span.record("criterion", field::debug(criterion));
    }
    if let Some(threshold) = command.threshold {
        span.record("threshold", threshold);
        builder = builder.with_labelling(LabellingStrategy::Threshold { threshold });
    }
    let pipeline = builder.build()?;

    let input = load_input(&command.source)?;
    let segmentation = pipeline.run(&input.graph, &input.weights)?;
    info!(
        regions = segmentation.labelling().label_count(),
        nodes = segmentation.hierarchy().tree().node_count(),
        "command completed"
    );
    Ok(ExecutionSummary::new(
        command.format,
        input.graph.vertex_count(),
        Some(segmentation.labelling().labels().to_vec()),
        segmentation.into_hierarchy(),
    ))
}

#[instrument(
    name = "cli.watershed",
    err,
    skip(command),
    fields(criterion = ?command.criterion),
)]
pub(super) fn run_watershed(command: WatershedCommand) -> Result<ExecutionSummary, CliError> {
    let input = load_input(&command.source)?;
    let criterion = Criterion::from(command.criterion);
    let hierarchy = bpt_canonical(&input.graph, &input.weights)
        .and_then(|tree| watershed_hierarchy(&tree, &criterion))
        .map_err(DendraError::from)?;
    info!(
        nodes = hierarchy.tree().node_count(),
        "command completed"
    );
    Ok(ExecutionSummary::new(
        command.format,
        input.graph.vertex_count(),
        None,
        hierarchy,
    ))
}

#[instrument(
    name = "cli.load_input",
    err,
    skip(source),
    fields(path = field::Empty, layout = field::Empty),
)]
pub(super) fn load_input(source: &InputSource) -> Result<GraphInput, CliError> {
    let span = Span::current();
    let (path, parsed) = match source {
        InputSource::Edges(args) => {
            span.record("layout", "edges");
            span.record("path", field::display(args.path.display()));
            let reader = open_reader(&args.path)?;
            (&args.path, parse_edge_list(reader, args.vertices))
        }
        InputSource::Grid(args) => {
            span.record("layout", "grid");
            span.record("path", field::display(args.path.display()));
            let reader = open_reader(&args.path)?;
            (&args.path, parse_grid_weights(reader, args.rows, args.cols))
        }
    };
    parsed.map_err(|source| CliError::Input {
        path: path.clone(),
        source,
    })
}

fn open_reader(path: &Path) -> Result<BufReader<File>, CliError> {
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Renders `summary` to `writer` in its requested format.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use dendra_cli::cli::{ExecutionSummary, OutputFormat, render_summary};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let summary = ExecutionSummary {
///     format: OutputFormat::Text,
///     vertices: 2,
///     labels: None,
///     parents: vec![2, 2, 2],
///     altitudes: vec![0.0, 0.0, 1.5],
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// assert_eq!(
///     String::from_utf8(buffer)?,
///     "vertices: 2\nparents: 2 2 2\naltitudes: 0 0 1.5\n",
/// );
/// # Ok(())
/// # }
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    match summary.format {
        OutputFormat::Json => {
            serde_json::to_writer(&mut writer, summary)?;
            writeln!(writer)
        }
        OutputFormat::Text => {
            writeln!(writer, "vertices: {}", summary.vertices)?;
            if let Some(labels) = &summary.labels {
                write_row(&mut writer, "labels", labels)?;
            }
            write_row(&mut writer, "parents", &summary.parents)?;
            write_row(&mut writer, "altitudes", &summary.altitudes)
        }
    }
}

fn write_row<T: std::fmt::Display>(
    writer: &mut impl Write,
    key: &str,
    values: &[T],
) -> io::Result<()> {
    write!(writer, "{key}:")?;
    for value in values {
        write!(writer, " {value}")?;
    }
    writeln!(writer)
}
