//! Support library for the dendra CLI binary.
//!
//! Exposes the command and logging modules so doctests and unit tests can
//! exercise the pipeline without forking a subprocess.

pub mod cli;
pub mod logging;
