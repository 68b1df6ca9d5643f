//! Unit tests for the CLI commands and input readers.

use super::commands::{load_input, run_command};
use super::test_helpers::{
    create_input_file, edges, grid, run, run_cli_expecting_error, temp_dir,
};
use super::{
    Cli, CliError, Command, CriterionArg, EdgesArgs, ExecutionSummary, InputError, InputSource,
    LinkageArg, MAX_IMPLIED_GAP, OutputFormat, WatershedCommand, parse_edge_list,
    parse_grid_weights, render_summary, run_cli,
};

use clap::Parser;
use dendra_core::{
    DendraError, EdgeGraph, GraphError, HierarchyError, HierarchyErrorCode, four_adjacency_edges,
};
use dendra_test_support::tracing::RecordingLayer;
use rstest::rstest;
use tracing::Level;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const STEP_EDGES: &str = "# two basins split by a heavy edge\n0 1 0\n\n1 2 5\n2 3 1\n";

#[rstest]
fn run_segments_edge_list() -> TestResult {
    let dir = temp_dir();
    let path = create_input_file(&dir, "step.txt", STEP_EDGES)?;
    let summary = run_cli(Cli {
        command: Command::Run(run(edges(path))),
    })?;
    assert_eq!(summary.vertices, 4);
    assert_eq!(summary.labels, Some(vec![0, 0, 1, 1]));
    assert_eq!(summary.parents, vec![2, 2, 2]);
    assert_eq!(summary.altitudes, vec![0.0, 0.0, 5.0]);

    let mut rendered = Vec::new();
    render_summary(&summary, &mut rendered)?;
    assert_eq!(
        String::from_utf8(rendered)?,
        "vertices: 4\nlabels: 0 0 1 1\nparents: 2 2 2\naltitudes: 0 0 5\n"
    );
    Ok(())
}

#[rstest]
fn threshold_merges_everything_below_it() -> TestResult {
    let dir = temp_dir();
    let path = create_input_file(&dir, "step.txt", STEP_EDGES)?;
    let mut command = run(edges(path));
    command.threshold = Some(5.0);
    let summary = run_cli(Cli {
        command: Command::Run(command),
    })?;
    assert_eq!(summary.labels, Some(vec![0, 0, 0, 0]));
    assert_eq!(summary.parents, vec![0]);
    Ok(())
}

#[rstest]
#[case::dynamics(CriterionArg::Dynamics, [2.0, 3.0])]
#[case::volume(CriterionArg::Volume, [4.0, 6.0])]
fn watershed_reads_grid(#[case] criterion: CriterionArg, #[case] top: [f64; 2]) -> TestResult {
    let dir = temp_dir();
    let path = create_input_file(&dir, "line.txt", "1\n4\n1\n0\n10\n8\n")?;
    let summary = run_cli(Cli {
        command: Command::Watershed(WatershedCommand {
            criterion,
            format: OutputFormat::Json,
            source: grid(path, 1, 7),
        }),
    })?;
    assert_eq!(summary.labels, None);
    assert_eq!(summary.parents, vec![7, 7, 8, 8, 8, 9, 9, 11, 10, 10, 11, 11]);
    assert_eq!(&summary.altitudes[7..], &[0.0, 0.0, 0.0, top[0], top[1]]);
    Ok(())
}

#[rstest]
fn json_output_omits_missing_labels() -> TestResult {
    let summary = ExecutionSummary {
        format: OutputFormat::Json,
        vertices: 2,
        labels: None,
        parents: vec![2, 2, 2],
        altitudes: vec![0.0, 0.0, 1.5],
    };
    let mut rendered = Vec::new();
    render_summary(&summary, &mut rendered)?;
    let value: serde_json::Value = serde_json::from_slice(&rendered)?;
    assert_eq!(value["vertices"], serde_json::json!(2));
    assert_eq!(value["parents"], serde_json::json!([2, 2, 2]));
    assert_eq!(value["altitudes"], serde_json::json!([0.0, 0.0, 1.5]));
    assert!(value.get("labels").is_none());
    assert!(value.get("format").is_none());
    Ok(())
}

#[rstest]
fn disconnected_input_reports_hierarchy_code() -> TestResult {
    let dir = temp_dir();
    let path = create_input_file(&dir, "split.txt", "0 1 1\n2 3 1\n")?;
    let err = run_cli_expecting_error(
        Command::Run(run(edges(path))),
        "disconnected graphs have no hierarchy",
    );
    let core = match err {
        CliError::Core(core) => core,
        other => panic!("expected a core error, got {other:?}"),
    };
    assert_eq!(
        core,
        DendraError::Hierarchy(HierarchyError::DisconnectedGraph { components: 2 })
    );
    assert_eq!(core.code().as_str(), "DENDRA_HIERARCHY_FAILURE");
    assert_eq!(
        core.hierarchy_code(),
        Some(HierarchyErrorCode::DisconnectedGraph)
    );
    Ok(())
}

#[rstest]
fn non_finite_threshold_is_rejected() -> TestResult {
    let dir = temp_dir();
    let path = create_input_file(&dir, "step.txt", STEP_EDGES)?;
    let mut command = run(edges(path));
    command.threshold = Some(f64::INFINITY);
    let err = run_cli_expecting_error(Command::Run(command), "threshold must be finite");
    assert!(matches!(
        err,
        CliError::Core(DendraError::InvalidThreshold { .. })
    ));
    Ok(())
}

#[rstest]
fn grid_size_mismatch_is_reported() -> TestResult {
    let dir = temp_dir();
    let path = create_input_file(&dir, "grid.txt", "1\n2\n")?;
    let err = run_cli_expecting_error(
        Command::Run(run(grid(path, 2, 2))),
        "two weights cannot cover a 2x2 grid",
    );
    assert!(matches!(
        err,
        CliError::Input {
            source: InputError::GridSize {
                expected: 4,
                got: 2,
                ..
            },
            ..
        }
    ));
    Ok(())
}

#[rstest]
#[case::missing_weight("0 1\n", 1)]
#[case::extra_field("# header\n0 1 2 3\n", 2)]
#[case::not_a_number("0 1 heavy\n", 1)]
#[case::negative_vertex("-1 1 2\n", 1)]
fn malformed_edge_lines_are_rejected(#[case] contents: &str, #[case] expected_line: usize) {
    let err = parse_edge_list(contents.as_bytes(), None).expect_err("line is malformed");
    assert!(matches!(
        err,
        InputError::Malformed { line, .. } if line == expected_line
    ));
}

#[test]
fn declared_vertex_count_bounds_edges() {
    let padded = parse_edge_list("0 1 2\n".as_bytes(), Some(3)).expect("edge fits");
    assert_eq!(padded.graph.vertex_count(), 3);

    let err = parse_edge_list("0 2 1\n".as_bytes(), Some(2)).expect_err("vertex 2 is undeclared");
    assert!(matches!(
        err,
        InputError::Edge {
            line: 1,
            source: GraphError::VertexOutOfRange {
                vertex: 2,
                vertex_count: 2
            },
        }
    ));
}

#[test]
fn grid_weights_follow_row_major_edges() {
    let input = parse_grid_weights("# 2x3\n1\n2\n3\n4\n5\n6\n7\n".as_bytes(), 2, 3)
        .expect("seven weights cover a 2x3 grid");
    assert_eq!(input.graph.vertex_count(), 6);
    assert_eq!(input.weights, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    let edges: Vec<(usize, usize)> = input
        .graph
        .edges()
        .map(|(_, edge)| (edge.source(), edge.target()))
        .collect();
    assert_eq!(edges, four_adjacency_edges(2, 3));
}

#[test]
fn oversized_grids_are_rejected_before_allocation() {
    let err = parse_grid_weights("1\n".as_bytes(), usize::MAX, 3).expect_err("grid overflows");
    assert!(matches!(
        err,
        InputError::GridTooLarge {
            rows: usize::MAX,
            cols: 3
        }
    ));
}

#[rstest]
#[case::overflowing_id(format!("0 1 1\n{} 0 2\n", usize::MAX), 2)]
#[case::distant_id(format!("0 {} 1\n", MAX_IMPLIED_GAP + 2), 1)]
fn huge_vertex_ids_need_a_declared_count(#[case] contents: String, #[case] expected_line: usize) {
    let err = parse_edge_list(contents.as_bytes(), None).expect_err("vertex id is too large");
    assert!(matches!(
        err,
        InputError::Malformed { line, .. } if line == expected_line
    ));
}

#[test]
fn implied_vertex_count_allows_small_gaps() {
    let input = parse_edge_list(format!("0 {MAX_IMPLIED_GAP} 1\n").as_bytes(), None)
        .expect("gap is within the limit");
    assert_eq!(input.graph.vertex_count(), MAX_IMPLIED_GAP + 1);
}

#[test]
fn cli_parses_run_options() {
    let cli = Cli::try_parse_from([
        "dendra",
        "run",
        "--linkage",
        "complete",
        "--criterion",
        "volume",
        "--format",
        "json",
        "grid",
        "weights.txt",
        "--rows",
        "2",
        "--cols",
        "3",
    ])
    .expect("arguments are valid");
    let Command::Run(command) = cli.command else {
        panic!("expected the run command");
    };
    assert_eq!(command.linkage, LinkageArg::Complete);
    assert_eq!(command.criterion, Some(CriterionArg::Volume));
    assert_eq!(command.format, OutputFormat::Json);
    assert!(matches!(
        command.source,
        InputSource::Grid(args) if args.rows == 2 && args.cols == 3
    ));
}

#[rstest]
#[case(&["dendra", "run", "--linkage", "ward", "edges", "g.txt"])]
#[case(&["dendra", "watershed", "edges", "g.txt"])]
#[case(&["dendra", "run", "grid", "g.txt", "--rows", "2"])]
fn cli_rejects_invalid_arguments(#[case] args: &[&str]) {
    assert!(Cli::try_parse_from(args).is_err());
}

#[rstest]
fn run_command_emits_tracing_fields() -> TestResult {
    let dir = temp_dir();
    let path = create_input_file(&dir, "step.txt", STEP_EDGES)?;
    let mut command = run(edges(path));
    command.linkage = LinkageArg::Single;
    command.criterion = Some(CriterionArg::Area);

    let (summary, layer) = RecordingLayer::capture(|| run_command(command));
    assert_eq!(summary?.labels, Some(vec![0, 0, 1, 1]));

    let execute = layer.span("cli.execute").expect("cli.execute span must exist");
    assert_eq!(execute.field("linkage"), Some("Single"));
    assert_eq!(execute.field("criterion"), Some("Area"));
    let load = layer.span("cli.load_input").expect("cli.load_input span must exist");
    assert_eq!(load.field("layout"), Some("edges"));
    assert!(layer.span("core.run").is_some());
    assert!(layer.has_event(Level::INFO, "command completed"));
    Ok(())
}

#[rstest]
fn load_input_records_path_on_error() {
    let dir = temp_dir();
    let source = InputSource::Edges(EdgesArgs {
        path: dir.path().join("missing.txt"),
        vertices: None,
    });

    let (result, layer) = RecordingLayer::capture(|| load_input(&source));
    assert!(matches!(result, Err(CliError::Io { .. })));
    let span = layer.span("cli.load_input").expect("load span must exist");
    assert!(span.field("path").is_some_and(|path| path.ends_with("missing.txt")));
}
