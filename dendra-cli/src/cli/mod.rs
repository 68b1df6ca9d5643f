//! Command-line interface for building segmentation hierarchies.
//!
//! `run` labels the input graph into regions and builds the region hierarchy;
//! `watershed` builds the watershed hierarchy of the input graph directly.
//! Inputs are edge lists or 4-adjacency grids read from text files.

mod commands;
mod input;

pub use commands::{
    Cli, CliError, Command, CriterionArg, EdgesArgs, ExecutionSummary, GridArgs, InputSource,
    LinkageArg, OutputFormat, RunCommand, WatershedCommand, render_summary, run_cli,
};
pub use input::{GraphInput, InputError, MAX_IMPLIED_GAP, parse_edge_list, parse_grid_weights};

#[cfg(test)]
mod test_helpers;
#[cfg(test)]
mod tests;
