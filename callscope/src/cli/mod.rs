//! Command-line interface for the `callscope` demo binary
//!
//! - `args`: clap argument definitions
//! - `workload`: instrumented demo programs to profile

pub mod args;
pub mod workload;

pub use args::{Args, OutputFormat, Unit, Workload};
