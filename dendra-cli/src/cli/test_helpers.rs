//! Small helpers shared across CLI tests.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use tempfile::TempDir;

use super::{
    Cli, CliError, Command, EdgesArgs, GridArgs, InputSource, LinkageArg, OutputFormat,
    RunCommand, run_cli,
};

pub(super) fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

pub(super) fn create_input_file(dir: &TempDir, name: &str, contents: &str) -> io::Result<PathBuf> {
    let path = dir.path().join(name);
    let mut file = File::create(&path)?;
    file.write_all(contents.as_bytes())?;
    Ok(path)
}

pub(super) fn edges(path: PathBuf) -> InputSource {
    InputSource::Edges(EdgesArgs {
        path,
        vertices: None,
    })
}

pub(super) fn grid(path: PathBuf, rows: usize, cols: usize) -> InputSource {
    InputSource::Grid(GridArgs { path, rows, cols })
}

pub(super) fn run(source: InputSource) -> RunCommand {
    RunCommand {
        linkage: LinkageArg::Average,
        criterion: None,
        threshold: None,
        format: OutputFormat::Text,
        source,
    }
}

pub(super) fn run_cli_expecting_error(command: Command, panic_msg: &str) -> CliError {
    match run_cli(Cli { command }) {
        Ok(_) => panic!("{panic_msg}"),
        Err(err) => err,
    }
}
